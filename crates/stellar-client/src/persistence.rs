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

//! Flat CSV persistence of fetched frames.

use crate::errors::{StellarError, StellarResult};
use crate::table::{Series, TIME_KEY, TelemetryFrame};
use chrono::DateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Index format in saved files; timestamps are written localized to UTC
pub const CSV_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Writes fetched frames to a path template
#[derive(Debug, Clone)]
pub struct CsvSink {
    template: String,
}

impl CsvSink {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Destination for `site`, with `{site}` and `{}` substituted
    pub fn path_for(&self, site: &str) -> PathBuf {
        PathBuf::from(self.template.replace("{site}", site).replace("{}", site))
    }

    /// Write `frame`, overwriting any existing file, and return the path used
    pub fn save(&self, frame: &TelemetryFrame, site: &str) -> StellarResult<PathBuf> {
        let path = self.path_for(site);
        write_csv(frame, &path)?;
        debug!("Saved stellar api data to: {}", path.display());
        Ok(path)
    }
}

/// Write a frame with a `time,<params...>` header.
///
/// An empty frame produces a header-only file. Every row has a cell per
/// column: a column shorter than the index is written with empty trailing
/// cells and reads back padded with `None`, while values past the index are
/// not written. Padding only happens in the file; the frame itself is left
/// as it is.
pub fn write_csv(frame: &TelemetryFrame, path: &Path) -> StellarResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![TIME_KEY];
    header.extend(frame.column_names());
    writer.write_record(&header)?;

    if frame.is_empty() {
        info!("No data to save, writing header only to {}", path.display());
        writer.flush()?;
        return Ok(());
    }

    let truncated: Vec<&str> = frame
        .columns()
        .iter()
        .filter(|c| c.len() > frame.row_count())
        .map(|c| c.name.as_str())
        .collect();
    if !truncated.is_empty() {
        warn!(
            "Columns {:?} have more values than timestamps; extra values are not written",
            truncated
        );
    }

    for (row, timestamp) in frame.index_utc().iter().enumerate() {
        let mut record = Vec::with_capacity(frame.columns().len() + 1);
        record.push(timestamp.format(CSV_TIME_FORMAT).to_string());
        for column in frame.columns() {
            record.push(
                column
                    .values
                    .get(row)
                    .copied()
                    .flatten()
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Load a file written by [`write_csv`]; the index comes back as naive UTC
pub fn read_csv(path: &Path) -> StellarResult<TelemetryFrame> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    match headers.get(0) {
        Some(TIME_KEY) => {}
        Some(other) => {
            return Err(StellarError::InvalidCsv(format!(
                "first column must be '{TIME_KEY}', found '{other}'"
            )));
        }
        None => return Err(StellarError::InvalidCsv("missing header row".to_owned())),
    }

    let mut index = Vec::new();
    let mut columns: Vec<Series> = headers.iter().skip(1).map(Series::new).collect();

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let raw_time = record.get(0).unwrap_or_default();
        let timestamp = DateTime::parse_from_str(raw_time, CSV_TIME_FORMAT).map_err(|source| {
            StellarError::TimestampError {
                value: raw_time.to_owned(),
                source,
            }
        })?;
        index.push(timestamp.naive_utc());

        for (column, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
            let value = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|e| {
                    StellarError::InvalidCsv(format!(
                        "row {}, column '{}': {e}",
                        line + 1,
                        column.name
                    ))
                })?)
            };
            column.values.push(value);
        }
    }

    if index.is_empty() && columns.is_empty() {
        return Ok(TelemetryFrame::empty());
    }
    Ok(TelemetryFrame::from_parts(index, columns))
}
