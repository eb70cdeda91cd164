// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! CLI argument definitions using clap.

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stellar")]
#[command(author, version, about = "Fetch time-series data from the Stellar API")]
#[command(
    long_about = "Fetch a time range of parameters for one power system from the New Sun Road\n\
    Stellar API, in batches of a few days per request, and optionally save it as CSV.\n\
    \nThe API token is taken from --token, the STELLAR_TOKEN environment variable,\n\
    or a .token.txt file in the working directory.\n\
    \nExamples:\n  \
    stellar --config config.toml --start 2018-11-14 --stop 2018-11-15T06:00:00\n  \
    stellar --start 2019-05-06 --stop 2019-05-07 --params meteredLoadPower --summary"
)]
pub struct Cli {
    /// TOML configuration file (defaults to ./config.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start of the range (inclusive), UTC
    #[arg(long, value_parser = parse_cli_timestamp)]
    pub start: NaiveDateTime,

    /// End of the range (exclusive), UTC
    #[arg(long, value_parser = parse_cli_timestamp)]
    pub stop: NaiveDateTime,

    /// Comma-separated parameter names, overriding the configuration
    #[arg(long)]
    pub params: Option<String>,

    /// Bin duration, e.g. 1-mins or 5-mins
    #[arg(long)]
    pub resolution: Option<String>,

    /// Days requested per API call
    #[arg(long)]
    pub batch_size_days: Option<i64>,

    /// CSV output path; `{}` is replaced by the site id
    #[arg(long)]
    pub save_to: Option<String>,

    /// API token
    #[arg(long)]
    pub token: Option<String>,

    /// Print the mean of every column
    #[arg(long)]
    pub summary: bool,
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD HH:MM:SS`
pub fn parse_cli_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(t);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            format!("invalid timestamp '{value}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)")
        })
}
