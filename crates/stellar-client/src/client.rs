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

use crate::config::{ClientConfig, validate_query};
use crate::errors::{StellarError, StellarResult};
use crate::persistence::CsvSink;
use crate::response::{ParseOutcome, parse_body};
use crate::session::SessionContext;
use crate::table::{SeriesAccumulator, TelemetryFrame};
use crate::time_range::{BatchSpan, BatchWindow, TimeRange};
use chrono::NaiveDateTime;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::{debug, error, info, warn};

/// One fetch: which site, which parameters, at which resolution, over which range
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub site: String,
    pub parameters: Vec<String>,
    pub resolution: String,
    pub range: TimeRange,
}

impl FetchRequest {
    pub fn new(
        site: impl Into<String>,
        parameters: Vec<String>,
        resolution: impl Into<String>,
        range: TimeRange,
    ) -> Self {
        Self {
            site: site.into(),
            parameters,
            resolution: resolution.into(),
            range,
        }
    }

    fn validate(&self) -> StellarResult<()> {
        validate_query(&self.site, &self.parameters, &self.resolution)
    }
}

/// Blocking Stellar API client.
///
/// Construction selects the organization; every fetch afterwards reuses the
/// same session and issues one request per batch window, in order.
#[derive(Debug)]
pub struct StellarClient {
    config: ClientConfig,
    http: Client,
    session: SessionContext,
    span: BatchSpan,
}

impl StellarClient {
    pub fn new(config: ClientConfig) -> StellarResult<Self> {
        config.validate()?;
        let span = config.batch_span()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| StellarError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        let session =
            SessionContext::bootstrap(&http, &config.base_url, &config.organization, &config.token)?;

        Ok(Self {
            config,
            http,
            session,
            span,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn batch_span(&self) -> BatchSpan {
        self.span
    }

    /// Request for the configured site, parameters and resolution
    pub fn request_for(&self, start: NaiveDateTime, stop: NaiveDateTime) -> FetchRequest {
        FetchRequest::new(
            self.config.site.clone(),
            self.config.parameters.clone(),
            self.config.resolution.clone(),
            TimeRange::new(start, stop),
        )
    }

    /// Fetch `[start, stop)` for the configured system and save it if an
    /// output path is configured.
    pub fn get_data(
        &self,
        start: NaiveDateTime,
        stop: NaiveDateTime,
    ) -> StellarResult<TelemetryFrame> {
        let request = self.request_for(start, stop);
        let frame = self.fetch(&request)?;

        if let Some(template) = self.config.save_to.as_deref().filter(|t| !t.is_empty()) {
            CsvSink::new(template).save(&frame, &request.site)?;
        }

        Ok(frame)
    }

    /// Fetch and merge every batch window of the request.
    ///
    /// A non-200 response on any window aborts the whole fetch and discards
    /// what was merged so far. A 200 response with an undecodable body is
    /// logged and contributes nothing.
    pub fn fetch(&self, request: &FetchRequest) -> StellarResult<TelemetryFrame> {
        request.validate()?;

        let total = request.range.window_count(self.span);
        debug!(
            "Getting data for {} for {} ({} window(s) of at most {})",
            request.site, request.range, total, self.span
        );

        let mut accumulator = SeriesAccumulator::new();
        for (i, window) in request.range.windows(self.span).enumerate() {
            debug!("Window {}/{}: {}", i + 1, total, window);

            match self.fetch_window(request, &window)? {
                ParseOutcome::Parsed(records) => {
                    debug!("   {} record(s)", records.len());
                    accumulator.merge_records(&records);
                }
                ParseOutcome::Malformed(reason) => {
                    warn!(
                        "Skipping window {} for {}: response body could not be decoded: {}",
                        window, request.site, reason
                    );
                }
            }
        }

        let frame = accumulator.into_frame()?;
        info!(
            "Data received for {}: {} row(s), {} column(s)",
            request.site,
            frame.row_count(),
            frame.columns().len()
        );
        Ok(frame)
    }

    fn fetch_window(
        &self,
        request: &FetchRequest,
        window: &BatchWindow,
    ) -> StellarResult<ParseOutcome> {
        let url = format!(
            "{}/api/v0/ts/{}",
            self.config.base_url.trim_end_matches('/'),
            request.site
        );
        let query = [
            ("start", window.start_param()),
            ("end", window.end_param()),
            ("binDuration", request.resolution.clone()),
            ("params", request.parameters.join(",")),
        ];
        debug!("   URL: {} {:?}", url, query);

        let response = self
            .session
            .authorize(self.http.get(&url).query(&query))
            .send()?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text()?;
                Ok(parse_body(&body))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!(
                    "Token or session rejected while fetching {} ({})",
                    request.site, window
                );
                Err(StellarError::AuthenticationFailed {
                    context: format!("fetching site '{}'", request.site),
                })
            }
            status => {
                let message = response.text().unwrap_or_default();
                error!(
                    "Fetching {} ({}) failed with status {}: {}",
                    request.site, window, status, message
                );
                Err(StellarError::ApiError {
                    site: request.site.clone(),
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}
