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

//! Client for the New Sun Road Stellar time-series API.
//!
//! ```no_run
//! # use stellar_client::{ClientConfig, StellarClient};
//! # use chrono::NaiveDate;
//! let config = ClientConfig::new("newsunroad", "pc_solstation_a", "token", "batteryVoltage,batteryCurrent")
//!     .with_save_to("out.csv");
//! let client = StellarClient::new(config).unwrap();
//! let start = NaiveDate::from_ymd_opt(2018, 11, 14).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let stop = NaiveDate::from_ymd_opt(2018, 11, 15).unwrap().and_hms_opt(6, 0, 0).unwrap();
//! let frame = client.get_data(start, stop).unwrap();
//! println!("{} rows", frame.row_count());
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod persistence;
pub mod response;
pub mod session;
pub mod table;
pub mod time_range;

pub use client::{FetchRequest, StellarClient};
pub use config::{ClientConfig, DEFAULT_BASE_URL, split_parameters};
pub use errors::{StellarError, StellarResult};
pub use persistence::{CsvSink, read_csv, write_csv};
pub use response::{ParseOutcome, Record, TimeSeriesResponse, parse_body};
pub use session::SessionContext;
pub use table::{Series, SeriesAccumulator, TelemetryFrame};
pub use time_range::{BatchSpan, BatchWindow, TimeRange};
