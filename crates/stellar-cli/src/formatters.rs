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

//! Console rendering of fetched frames.

use stellar_client::TelemetryFrame;

/// Rows shown at each end of a long frame
const PREVIEW_ROWS: usize = 5;

pub fn format_frame(frame: &TelemetryFrame) -> String {
    if frame.is_empty() {
        return "Empty frame (no rows, no columns)".to_owned();
    }

    let names = frame.column_names();
    let widths: Vec<usize> = names.iter().map(|n| n.len().max(10)).collect();

    let mut out = format!("{:<19}", "time");
    for (name, width) in names.iter().zip(widths.iter().copied()) {
        out.push_str(&format!("  {name:>width$}"));
    }
    out.push('\n');

    let rows = frame.row_count();
    let shown: Vec<usize> = if rows > PREVIEW_ROWS * 2 {
        (0..PREVIEW_ROWS).chain(rows - PREVIEW_ROWS..rows).collect()
    } else {
        (0..rows).collect()
    };

    for (i, &row) in shown.iter().enumerate() {
        if i == PREVIEW_ROWS && rows > PREVIEW_ROWS * 2 {
            out.push_str("...\n");
        }
        out.push_str(&frame.index()[row].format("%Y-%m-%d %H:%M:%S").to_string());
        for (name, width) in names.iter().zip(widths.iter().copied()) {
            let cell = frame
                .value(row, name)
                .map_or_else(|| "NaN".to_owned(), |v| format!("{v:.3}"));
            out.push_str(&format!("  {cell:>width$}"));
        }
        out.push('\n');
    }

    out.push_str(&format!("\n[{} rows x {} columns]", rows, names.len()));
    out
}

pub fn format_means(frame: &TelemetryFrame) -> String {
    frame
        .column_means()
        .into_iter()
        .map(|(name, mean)| match mean {
            Some(mean) => format!("{name:<30} {mean:.6}"),
            None => format!("{name:<30} NaN"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
