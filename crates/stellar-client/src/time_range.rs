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

//! Query ranges and their partitioning into batch windows.
//!
//! Timestamps are timezone-naive and interpreted as UTC, both on the wire and
//! in the resulting table index.

use crate::errors::{StellarError, StellarResult};
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date-time format used for the `start`/`end` query parameters
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Maximum span of a single data request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    days: i64,
    delta: TimeDelta,
}

impl BatchSpan {
    /// Rejects zero and negative spans, which would never advance the cursor.
    pub fn from_days(days: i64) -> StellarResult<Self> {
        if days <= 0 {
            return Err(StellarError::ConfigError(format!(
                "Batch span must be at least one day, got {days}"
            )));
        }
        let delta = TimeDelta::try_days(days).ok_or_else(|| {
            StellarError::ConfigError(format!("Batch span of {days} days is out of range"))
        })?;
        Ok(Self { days, delta })
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.delta
    }
}

impl fmt::Display for BatchSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} day(s)", self.days)
    }
}

/// Query window: `start` inclusive, `stop` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, stop: NaiveDateTime) -> Self {
        Self { start, stop }
    }

    /// True when no window would be produced (`start >= stop`)
    pub fn is_empty(&self) -> bool {
        self.start >= self.stop
    }

    /// Contiguous, non-overlapping windows covering the range in order.
    ///
    /// The last window is clamped to `stop`, so the range does not need to be
    /// a multiple of the span.
    pub fn windows(&self, span: BatchSpan) -> BatchWindows {
        BatchWindows {
            cursor: self.start,
            stop: self.stop,
            span: span.as_delta(),
        }
    }

    /// Number of requests a fetch over this range issues
    pub fn window_count(&self, span: BatchSpan) -> usize {
        self.windows(span).count()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.stop)
    }
}

/// One sub-range of a [`TimeRange`], requested with a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BatchWindow {
    pub fn start_param(&self) -> String {
        self.start.format(WIRE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(WIRE_FORMAT).to_string()
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

impl fmt::Display for BatchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_param(), self.end_param())
    }
}

/// Iterator returned by [`TimeRange::windows`]
#[derive(Debug, Clone)]
pub struct BatchWindows {
    cursor: NaiveDateTime,
    stop: NaiveDateTime,
    span: TimeDelta,
}

impl Iterator for BatchWindows {
    type Item = BatchWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.stop {
            return None;
        }

        let end = self
            .cursor
            .checked_add_signed(self.span)
            .map_or(self.stop, |end| end.min(self.stop));
        let window = BatchWindow {
            start: self.cursor,
            end,
        };
        self.cursor = end;
        Some(window)
    }
}
