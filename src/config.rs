//! Provider configuration.
//!
//! The runtime hands the provider block to [`crate::ProviderService::configure`]
//! as JSON. Credentials that are not set in configuration are read from the
//! environment:
//!
//! - `CONTROL_PLANE_TOKEN`: a ready-made bearer token
//! - `CONTROL_PLANE_CLIENT_ID` / `CONTROL_PLANE_CLIENT_SECRET`: OAuth client
//!   credentials, exchanged for a token when the client connects

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::Diagnostic;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Schema};

/// Environment variable holding a bearer token.
pub const ENV_TOKEN: &str = "CONTROL_PLANE_TOKEN";
/// Environment variable holding the OAuth client id.
pub const ENV_CLIENT_ID: &str = "CONTROL_PLANE_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "CONTROL_PLANE_CLIENT_SECRET";

/// Provider configuration block.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Control-plane address: a host (`cp.example.com[:port]`) or a full URL.
    pub control_plane: String,
    /// OAuth client id.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Bearer token, used instead of client credentials when set.
    pub token: Option<String>,
    /// Skip TLS certificate verification.
    pub tls_skip_verify: bool,
    /// Deadline for each lifecycle call, in seconds.
    pub request_timeout_secs: Option<u64>,
}

/// How the client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A bearer token used as-is.
    Token(String),
    /// OAuth client credentials exchanged for a token.
    ClientCredentials {
        /// Client id.
        client_id: String,
        /// Client secret.
        client_secret: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProviderConfig")
            .field("control_plane", &self.control_plane)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("token", &redact(&self.token))
            .field("tls_skip_verify", &self.tls_skip_verify)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Configuration for `control_plane` authenticated with `token`.
    pub fn with_token(control_plane: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            control_plane: control_plane.into(),
            token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Parse the provider block. `null` yields the default configuration.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| ProviderError::Configuration(format!("invalid provider block: {}", e)))
    }

    /// Fill unset credentials from the process environment.
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|key| std::env::var(key).ok())
    }

    /// Fill unset credentials from `lookup`, keyed by the `ENV_*` names.
    pub fn with_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if self.token.is_none() {
            self.token = lookup(ENV_TOKEN);
        }
        if self.client_id.is_none() {
            self.client_id = lookup(ENV_CLIENT_ID);
        }
        if self.client_secret.is_none() {
            self.client_secret = lookup(ENV_CLIENT_SECRET);
        }
        self
    }

    /// The credentials to authenticate with. A token wins over client
    /// credentials.
    pub fn credentials(&self) -> Result<Credentials, ProviderError> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::Token(token.clone()));
        }
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Ok(Credentials::ClientCredentials {
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                })
            }
            _ => Err(ProviderError::Configuration(format!(
                "no credentials: set token or client_id and client_secret (or {}, {} and {})",
                ENV_TOKEN, ENV_CLIENT_ID, ENV_CLIENT_SECRET
            ))),
        }
    }

    /// The per-call deadline.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Check the configuration, returning error diagnostics for problems.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.control_plane.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error("Missing control plane address")
                    .with_detail("Set control_plane to the control-plane host, e.g. cp.example.com")
                    .with_attribute("control_plane"),
            );
        }
        if let Err(e) = self.credentials() {
            diagnostics.push(Diagnostic::error("Missing credentials").with_detail(e.to_string()));
        }
        if self.request_timeout_secs == Some(0) {
            diagnostics.push(
                Diagnostic::error("Invalid request timeout")
                    .with_detail("request_timeout_secs must be greater than zero")
                    .with_attribute("request_timeout_secs"),
            );
        }
        if self.tls_skip_verify {
            diagnostics.push(
                Diagnostic::warning("TLS verification disabled")
                    .with_attribute("tls_skip_verify"),
            );
        }
        diagnostics
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Connection settings for the control plane")
            .with_attribute(
                "control_plane",
                Attribute::required_string()
                    .with_description("Control-plane host, optionally with port, or a full URL"),
            )
            .with_attribute(
                "client_id",
                Attribute::optional_string().with_description(format!(
                    "OAuth client id. Falls back to {}",
                    ENV_CLIENT_ID
                )),
            )
            .with_attribute(
                "client_secret",
                Attribute::optional_string().sensitive().with_description(format!(
                    "OAuth client secret. Falls back to {}",
                    ENV_CLIENT_SECRET
                )),
            )
            .with_attribute(
                "token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("Bearer token. Falls back to {}", ENV_TOKEN)),
            )
            .with_attribute(
                "tls_skip_verify",
                Attribute::optional(AttributeType::Bool).with_default(Value::Bool(false)),
            )
            .with_attribute(
                "request_timeout_secs",
                Attribute::optional(AttributeType::Int64)
                    .with_description("Deadline for each create/read/update/delete call"),
            )
    }
}
