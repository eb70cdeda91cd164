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

//! Organization selection and the session cookies it yields.

use crate::errors::{StellarError, StellarResult};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{AUTHORIZATION, COOKIE};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Credential plus the cookies bound to one organization.
///
/// Immutable once bootstrapped; reusable for any number of sequential
/// requests against the same organization.
#[derive(Clone)]
pub struct SessionContext {
    organization: String,
    token: String,
    cookies: Vec<(String, String)>,
}

impl SessionContext {
    pub fn new(
        organization: impl Into<String>,
        token: impl Into<String>,
        cookies: Vec<(String, String)>,
    ) -> Self {
        Self {
            organization: organization.into(),
            token: token.into(),
            cookies,
        }
    }

    /// Select `organization` server-side and keep the returned cookies.
    ///
    /// Fails eagerly on a non-success status instead of returning an empty
    /// session that would only be rejected by the first data request.
    pub fn bootstrap(
        http: &Client,
        base_url: &str,
        organization: &str,
        token: &str,
    ) -> StellarResult<Self> {
        let url = format!(
            "{}/api/v0/setOrganization/{}",
            base_url.trim_end_matches('/'),
            organization
        );
        debug!("Selecting organization: {}", organization);
        debug!("   URL: {}", url);

        let response = http
            .post(&url)
            .header(AUTHORIZATION, authorization_value(token))
            .send()?;

        let status = response.status();
        if status.is_success() {
            let cookies: Vec<(String, String)> = response
                .cookies()
                .map(|c| (c.name().to_owned(), c.value().to_owned()))
                .collect();
            if cookies.is_empty() {
                warn!(
                    "Organization '{}' selected but no session cookies were returned",
                    organization
                );
            } else {
                info!(
                    "Session established for organization '{}' ({} cookie(s))",
                    organization,
                    cookies.len()
                );
            }
            return Ok(Self::new(organization, token, cookies));
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Token rejected while selecting organization '{}'", organization);
                Err(StellarError::AuthenticationFailed {
                    context: format!("selecting organization '{organization}'"),
                })
            }
            status => {
                let message = response.text().unwrap_or_default();
                error!(
                    "Selecting organization '{}' failed: status {}: {}",
                    organization, status, message
                );
                Err(StellarError::BootstrapFailed {
                    organization: organization.to_owned(),
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// Cookies rendered as one `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Attach the credential and session cookies to a request
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(AUTHORIZATION, authorization_value(&self.token));
        match self.cookie_header() {
            Some(cookies) => request.header(COOKIE, cookies),
            None => request,
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("organization", &self.organization)
            .field("token", &"<redacted>")
            .field("cookies", &self.cookies.len())
            .finish()
    }
}

fn authorization_value(token: &str) -> String {
    format!("token {token}")
}
