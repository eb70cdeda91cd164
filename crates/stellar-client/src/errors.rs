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

use thiserror::Error;

/// Stellar API client error types
#[derive(Error, Debug)]
pub enum StellarError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error(
        "Selecting organization '{organization}' failed with status {status}: {message}. \
         Check the organization id"
    )]
    BootstrapFailed {
        organization: String,
        status: u16,
        message: String,
    },

    #[error("Authentication failed ({context}): the token was rejected")]
    AuthenticationFailed { context: String },

    #[error(
        "Stellar API returned status {status} for site '{site}': {message}. \
         Check the site name and parameter list, or whether the API has changed"
    )]
    ApiError {
        site: String,
        status: u16,
        message: String,
    },

    #[error("Cannot parse timestamp '{value}': {source}")]
    TimestampError {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Response records carried {columns} parameter column(s) but no 'time' values")]
    MissingTimeColumn { columns: usize },

    #[error("Invalid CSV file: {0}")]
    InvalidCsv(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StellarResult<T> = Result<T, StellarError>;
