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

//! Column-oriented merge of paginated time-series records.

use crate::errors::{StellarError, StellarResult};
use crate::response::Record;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Record key holding the sample timestamp
pub const TIME_KEY: &str = "time";

/// Format of `time` values in responses; fractional seconds are optional
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Values of one parameter in append order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean of the non-null values
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .values
            .iter()
            .flatten()
            .fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / f64::from(count))
    }
}

/// Append-only per-key sequences built while merging a fetch.
///
/// Sequences are never padded: a record that omits a parameter leaves that
/// parameter one element shorter than `time`.
#[derive(Debug, Default)]
pub struct SeriesAccumulator {
    time: Vec<String>,
    series: Vec<Series>,
    positions: HashMap<String, usize>,
}

impl SeriesAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_records(&mut self, records: &[Record]) {
        for record in records {
            self.merge_record(record);
        }
    }

    pub fn merge_record(&mut self, record: &Record) {
        for (key, value) in record {
            self.push(key, value);
        }
    }

    pub fn push(&mut self, key: &str, value: &Value) {
        if key == TIME_KEY {
            let raw = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.time.push(raw);
            return;
        }

        let sample = sample_value(key, value);
        let idx = match self.positions.get(key) {
            Some(&idx) => idx,
            None => {
                self.series.push(Series::new(key));
                self.positions.insert(key.to_owned(), self.series.len() - 1);
                self.series.len() - 1
            }
        };
        self.series[idx].values.push(sample);
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty() && self.series.is_empty()
    }

    pub fn time_len(&self) -> usize {
        self.time.len()
    }

    /// Accumulated values for a parameter, `None` if it was never seen
    pub fn series(&self, name: &str) -> Option<&[Option<f64>]> {
        self.positions
            .get(name)
            .map(|&idx| self.series[idx].values.as_slice())
    }

    /// Parameter names in first-seen order
    pub fn column_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }

    /// Convert into the final table, parsing the `time` sequence.
    ///
    /// An empty accumulator gives an empty frame without touching timestamps.
    pub fn into_frame(self) -> StellarResult<TelemetryFrame> {
        if self.is_empty() {
            return Ok(TelemetryFrame::empty());
        }
        if self.time.is_empty() {
            return Err(StellarError::MissingTimeColumn {
                columns: self.series.len(),
            });
        }

        let index = self
            .time
            .iter()
            .map(String::as_str)
            .map(parse_timestamp)
            .collect::<StellarResult<Vec<_>>>()?;

        let frame = TelemetryFrame::from_parts(index, self.series);
        let skewed = frame.misaligned_columns();
        if !skewed.is_empty() {
            warn!(
                "Columns {:?} are not aligned with the {} timestamps (parameter missing from some records)",
                skewed,
                frame.row_count()
            );
        }
        Ok(frame)
    }
}

fn sample_value(key: &str, value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let parsed = s.trim().parse::<f64>().ok();
            if parsed.is_none() {
                debug!("Non-numeric value for {}: {:?}", key, s);
            }
            parsed
        }
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => {
            debug!("Unsupported value for {}: {}", key, value);
            None
        }
    }
}

pub fn parse_timestamp(raw: &str) -> StellarResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map_err(|source| {
        StellarError::TimestampError {
            value: raw.to_owned(),
            source,
        }
    })
}

/// Timestamp-indexed table produced by a fetch.
///
/// The index is timezone-naive (UTC by convention) until it is persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryFrame {
    index: Vec<NaiveDateTime>,
    columns: Vec<Series>,
}

impl TelemetryFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_parts(index: Vec<NaiveDateTime>, columns: Vec<Series>) -> Self {
        Self { index, columns }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.columns.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Index localized to UTC
    pub fn index_utc(&self) -> Vec<DateTime<Utc>> {
        self.index.iter().map(NaiveDateTime::and_utc).collect()
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Cell at `row` of column `name`; `None` for nulls and cells past the end
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name)
            .and_then(|c| c.values.get(row).copied().flatten())
    }

    /// Columns whose length differs from the index
    pub fn misaligned_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.len() != self.index.len())
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn column_means(&self) -> Vec<(&str, Option<f64>)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.mean()))
            .collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.index.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.index.last().copied()
    }
}
