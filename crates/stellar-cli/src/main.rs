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

mod args;
mod config;
mod formatters;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use stellar_client::{StellarClient, split_parameters};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::args::Cli;
use crate::config::{AppConfig, resolve_token};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = AppConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli)?;

    // Respects RUST_LOG, falling back to the configured level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.system.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default tracing subscriber failed")?;

    config.log_summary(&source);
    config
        .stellar
        .validate()
        .context("Invalid Stellar configuration")?;

    let client = StellarClient::new(config.stellar.clone()).with_context(|| {
        format!(
            "Could not open a session for organization '{}'",
            config.stellar.organization
        )
    })?;

    info!("Requesting {} to {}", cli.start, cli.stop);
    let frame = client
        .get_data(cli.start, cli.stop)
        .with_context(|| format!("Fetching data for site '{}' failed", config.stellar.site))?;

    println!("{}", formatters::format_frame(&frame));
    if cli.summary && !frame.is_empty() {
        println!();
        println!("{}", formatters::format_means(&frame));
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) -> Result<()> {
    if let Some(params) = &cli.params {
        config.stellar.parameters = split_parameters(params);
    }
    if let Some(resolution) = &cli.resolution {
        config.stellar.resolution.clone_from(resolution);
    }
    if let Some(days) = cli.batch_size_days {
        config.stellar.batch_size_days = days;
    }
    if let Some(save_to) = &cli.save_to {
        config.stellar.save_to = Some(save_to.clone());
    }

    config.stellar.token = resolve_token(
        cli.token.clone(),
        std::env::var("STELLAR_TOKEN").ok(),
        &config.stellar.token,
        Path::new(".token.txt"),
    )?;
    Ok(())
}
