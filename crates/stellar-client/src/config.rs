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

use crate::errors::{StellarError, StellarResult};
use crate::time_range::BatchSpan;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://stellar.newsunroad.com";

/// Everything the client needs to bootstrap and fetch.
///
/// The token is an opaque credential; loading it is left to the caller.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API host, overridable for testing
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Organization selected at bootstrap (e.g. "newsunroad")
    pub organization: String,

    /// Site or meter identifier (e.g. "pc_solstation_a")
    pub site: String,

    #[serde(skip_serializing, default)]
    pub token: String,

    /// Parameter names, sent comma-joined in the given order
    pub parameters: Vec<String>,

    /// Bin duration accepted by the API, e.g. "1-mins" or "5-mins"
    #[serde(default = "default_resolution")]
    pub resolution: String,

    /// Days requested per call; large spans make the API time out
    #[serde(default = "default_batch_size_days")]
    pub batch_size_days: i64,

    /// Optional CSV destination; `{}` or `{site}` is replaced by the site id
    #[serde(default)]
    pub save_to: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_resolution() -> String {
    "5-mins".to_owned()
}

fn default_batch_size_days() -> i64 {
    20
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            organization: String::new(),
            site: String::new(),
            token: String::new(),
            parameters: Vec::new(),
            resolution: default_resolution(),
            batch_size_days: default_batch_size_days(),
            save_to: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("site", &self.site)
            .field("parameters", &self.parameters)
            .field("resolution", &self.resolution)
            .field("batch_size_days", &self.batch_size_days)
            .field("save_to", &self.save_to)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    pub fn new(
        organization: impl Into<String>,
        site: impl Into<String>,
        token: impl Into<String>,
        parameters: &str,
    ) -> Self {
        Self {
            organization: organization.into(),
            site: site.into(),
            token: token.into(),
            parameters: split_parameters(parameters),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    pub fn with_batch_size_days(mut self, days: i64) -> Self {
        self.batch_size_days = days;
        self
    }

    pub fn with_save_to(mut self, path: impl Into<String>) -> Self {
        self.save_to = Some(path.into());
        self
    }

    pub fn validate(&self) -> StellarResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(config_error("base_url cannot be empty"));
        }
        if self.organization.trim().is_empty() {
            return Err(config_error("organization cannot be empty"));
        }
        if self.token.trim().is_empty() {
            return Err(config_error("API token cannot be empty"));
        }
        validate_query(&self.site, &self.parameters, &self.resolution)?;
        if self.timeout_secs == 0 {
            return Err(config_error("timeout_secs must be greater than zero"));
        }
        self.batch_span()?;
        Ok(())
    }

    pub fn batch_span(&self) -> StellarResult<BatchSpan> {
        BatchSpan::from_days(self.batch_size_days)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parameters as sent on the wire
    pub fn params_query(&self) -> String {
        self.parameters.join(",")
    }
}

/// Split a comma-separated parameter list, dropping surrounding whitespace
pub fn split_parameters(parameters: &str) -> Vec<String> {
    parameters
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Checks shared by the configuration and by every explicit fetch request
pub(crate) fn validate_query(
    site: &str,
    parameters: &[String],
    resolution: &str,
) -> StellarResult<()> {
    if site.trim().is_empty() {
        return Err(config_error("site cannot be empty"));
    }
    if parameters.is_empty() {
        return Err(config_error("at least one parameter is required"));
    }
    if let Some(idx) = parameters.iter().position(|p| p.trim().is_empty()) {
        return Err(config_error(&format!("parameters[{idx}] is blank")));
    }
    if resolution.trim().is_empty() {
        return Err(config_error("resolution cannot be empty"));
    }
    Ok(())
}

fn config_error(message: &str) -> StellarError {
    StellarError::ConfigError(message.to_owned())
}
