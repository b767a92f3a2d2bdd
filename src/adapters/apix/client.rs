//! APIX HTTP client
//!
//! Executes single APIX REST calls and interprets the response codes. APIX is slow
//! on large records, so the client is built with a long timeout and never follows
//! redirects: a 303 carries the `Location` we need.

use super::request::{ApixMethod, ApixRequest};
use crate::adapters::traits::LegacyEndpoint;
use crate::config::ApixConfig;
use crate::domain::{ApixError, ControlNumber, ExportError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Content type of every APIX request body
pub const APIX_CONTENT_TYPE: &str = "application/xml";

/// APIX client for one catalog database
pub struct ApixClient {
    client: Client,
    auth_header: Option<String>,
    location_pattern: Regex,
}

impl ApixClient {
    /// Create a new APIX client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApixConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()
            .map_err(|e| {
                ExportError::Configuration(format!("Failed to build APIX HTTP client: {e}"))
            })?;

        let auth_header = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                let password: &str = password.expose_secret().as_ref();
                let credentials = format!("{username}:{password}");
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {encoded}"))
            }
            _ => None,
        };

        Ok(Self {
            client,
            auth_header,
            location_pattern: location_pattern(&config.database)?,
        })
    }

    /// Extracts the control number from an APIX `Location` header
    pub fn parse_control_number(&self, location: &str) -> Result<ControlNumber> {
        parse_control_number(&self.location_pattern, location)
    }

    /// Maps an APIX response to the call outcome
    fn interpret(
        &self,
        method: ApixMethod,
        status: StatusCode,
        location: Option<&str>,
        body: String,
    ) -> Result<Option<ControlNumber>> {
        match status {
            // 200 is only legitimate on DELETE; on PUT it is an error in disguise
            StatusCode::OK if method == ApixMethod::Delete => Ok(None),
            StatusCode::OK => Err(ApixError::DisguisedFailure(body).into()),
            StatusCode::CREATED | StatusCode::SEE_OTHER => {
                let location = location.ok_or(ApixError::MissingLocation)?;
                self.parse_control_number(location).map(Some)
            }
            status => Err(ApixError::Transport {
                status: status.as_u16(),
                body,
            }
            .into()),
        }
    }
}

#[async_trait]
impl LegacyEndpoint for ApixClient {
    async fn execute(&self, request: &ApixRequest) -> Result<Option<ControlNumber>> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "Sending APIX request"
        );

        let mut builder = match request.method {
            ApixMethod::Put => self.client.put(&request.url),
            ApixMethod::Delete => self.client.delete(&request.url),
        };

        if let Some(auth) = &self.auth_header {
            builder = builder.header(AUTHORIZATION, auth);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, APIX_CONTENT_TYPE)
                .body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApixError::Timeout(e.to_string())
            } else {
                ApixError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response.text().await.unwrap_or_default();

        let outcome = self.interpret(request.method, status, location.as_deref(), body)?;

        tracing::info!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            location = location.as_deref().unwrap_or(""),
            "APIX {} OK",
            request.method
        );

        Ok(outcome)
    }
}

fn location_pattern(database: &str) -> Result<Regex> {
    Regex::new(&format!(
        r"cat/{}/(auth|bib|hold)/(\d+)$",
        regex::escape(database)
    ))
    .map_err(|e| ExportError::Configuration(format!("Invalid APIX database name: {e}")))
}

fn parse_control_number(pattern: &Regex, location: &str) -> Result<ControlNumber> {
    pattern
        .captures(location)
        .and_then(|caps| caps.get(2))
        .and_then(|number| ControlNumber::new(number.as_str()).ok())
        .ok_or_else(|| ApixError::UnparsableLocation(location.to_string()).into())
}
