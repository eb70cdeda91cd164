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

//! Wire types of the `/api/v0/ts/{site}` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One time-series record: parameter name to value, including `time`
pub type Record = Map<String, Value>;

/// Body of a successful time-series response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeriesResponse {
    pub data: Vec<TimeSeriesEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeriesEntry {
    #[serde(rename = "timeSeries")]
    pub time_series: Vec<Record>,
}

impl TimeSeriesResponse {
    /// All records of all entries, in response order
    pub fn into_records(self) -> Vec<Record> {
        self.data
            .into_iter()
            .flat_map(|entry| entry.time_series)
            .collect()
    }
}

/// Result of decoding a 200 response body
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Vec<Record>),
    /// Body was not JSON or did not have the expected shape
    Malformed(String),
}

pub fn parse_body(body: &str) -> ParseOutcome {
    match serde_json::from_str::<TimeSeriesResponse>(body) {
        Ok(response) => ParseOutcome::Parsed(response.into_records()),
        Err(e) => ParseOutcome::Malformed(e.to_string()),
    }
}
