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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use stellar_client::{ClientConfig, split_parameters};
use tracing::info;

/// Runner configuration: the client section plus process settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stellar: ClientConfig,

    #[serde(default)]
    pub system: SystemConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from ./config.toml, or from environment variables.
    ///
    /// Runs before logging is set up, so the source is reported by the caller.
    pub fn load(path: Option<&Path>) -> Result<(Self, String)> {
        if let Some(path) = path {
            let config = Self::from_file(path)?;
            return Ok((config, path.display().to_string()));
        }

        let default_path = Path::new("config.toml");
        if default_path.exists() {
            let config = Self::from_file(default_path)?;
            return Ok((config, "config.toml".to_owned()));
        }

        Ok((Self::from_env(), "environment".to_owned()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&config_str).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(org) = lookup("STELLAR_ORG") {
            config.stellar.organization = org;
        }
        if let Some(site) = lookup("STELLAR_SITE") {
            config.stellar.site = site;
        }
        if let Some(params) = lookup("STELLAR_PARAMS") {
            config.stellar.parameters = split_parameters(&params);
        }
        if let Some(url) = lookup("STELLAR_BASE_URL") {
            config.stellar.base_url = url;
        }
        if let Some(level) = lookup("STELLAR_LOG_LEVEL") {
            config.system.log_level = level;
        }

        config
    }

    pub fn log_summary(&self, source: &str) {
        info!("Loaded configuration from {}", source);
        info!("   Organization: {}", self.stellar.organization);
        info!("   Site: {}", self.stellar.site);
        info!("   Parameters: {}", self.stellar.params_query());
        info!(
            "   Resolution: {}, batch size: {} day(s)",
            self.stellar.resolution, self.stellar.batch_size_days
        );
        match &self.stellar.save_to {
            Some(path) => info!("   Save to: {}", path),
            None => info!("   Save to: (not saving)"),
        }
    }
}

/// Token from the command line, STELLAR_TOKEN, the config file, or a token
/// file, in that order. Blank values fall through to the next source.
pub fn resolve_token(
    cli_token: Option<String>,
    env_token: Option<String>,
    configured: &str,
    token_file: &Path,
) -> Result<String> {
    let explicit = [cli_token, env_token, Some(configured.to_owned())]
        .into_iter()
        .flatten()
        .find(|t| !t.trim().is_empty());
    if let Some(token) = explicit {
        return Ok(token.trim().to_owned());
    }

    match std::fs::read_to_string(token_file) {
        Ok(contents) if !contents.trim().is_empty() => Ok(contents.trim().to_owned()),
        Ok(_) => anyhow::bail!("No API token: {} is empty", token_file.display()),
        Err(e) => Err(e).with_context(|| {
            format!(
                "No API token: pass --token, set STELLAR_TOKEN or create {}",
                token_file.display()
            )
        }),
    }
}
