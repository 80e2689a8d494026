//! Outbound HTTP client for the control-plane API.
//!
//! A [`Client`] is built once per provider configuration and passed
//! explicitly into every lifecycle handler. It owns the base URL, the bearer
//! token and the underlying `reqwest` connection pool; it performs exactly
//! one attempt per call and never retries.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::{Credentials, ProviderConfig};
use crate::context::Context;
use crate::error::ProviderError;
use crate::operation::HttpMethod;

/// Path of the OAuth token endpoint.
pub const TOKEN_PATH: &str = "/v1/users/oidc/token";

/// Maximum number of response body characters kept in errors and logs.
const MAX_LOG_BODY_LENGTH: usize = 512;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("controlplane-provider/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticated handle to the control plane.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
    base_url: String,
    token: String,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client from provider configuration, exchanging client
    /// credentials for a token when no token is configured.
    #[instrument(skip_all, fields(control_plane = %config.control_plane))]
    pub async fn connect(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base = parse_base(&config.control_plane)?;
        let base_url = without_trailing_slash(&base);
        let http = build_http(config.tls_skip_verify)?;
        let ctx = Context::from_timeout(config.request_timeout());

        let token = match config.credentials()? {
            Credentials::Token(token) => token,
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => {
                let url = format!("{}{}", base_url, TOKEN_PATH);
                ctx.run(
                    "token exchange",
                    fetch_token(&http, &url, &client_id, &client_secret),
                )
                .await?
            }
        };

        debug!(base_url = %base_url, "Control plane client ready");
        Ok(Self {
            http,
            base,
            base_url,
            token,
            request_timeout: config.request_timeout(),
        })
    }

    /// Build a client for `control_plane` using a ready-made bearer token.
    pub fn with_token(control_plane: &str, token: impl Into<String>) -> Result<Self, ProviderError> {
        let base = parse_base(control_plane)?;
        Ok(Self {
            http: build_http(false)?,
            base_url: without_trailing_slash(&base),
            base,
            token: token.into(),
            request_timeout: None,
        })
    }

    /// Set the per-call deadline used by the provider.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The per-call deadline.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Absolute URL of `path` (which starts with `/`).
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Absolute URL of the fixed `path` followed by `segments`.
    ///
    /// Each segment is percent-encoded as a single path segment, so ids
    /// containing `/`, `?`, `#` or `%` cannot escape into another route.
    pub fn endpoint_with<I>(&self, path: &str, segments: I) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base.clone();
        // http(s) bases always have a host, so the path is segmentable
        if let Ok(mut parts) = url.path_segments_mut() {
            parts
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()))
                .extend(segments);
        }
        url.into()
    }

    /// Perform one request and return the raw response body.
    ///
    /// Non-2xx statuses become [`ProviderError::Http`], failures before a
    /// response arrives become [`ProviderError::Transport`], and running past
    /// the context deadline becomes [`ProviderError::DeadlineExceeded`].
    #[instrument(skip_all, fields(method = %method, url = %url))]
    pub async fn execute(
        &self,
        ctx: &Context,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, ProviderError> {
        let what = format!("{} {}", method, url);
        ctx.run(&what, self.send(method, url, body)).await
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, ProviderError> {
        let mut request = self
            .http
            .request(method.as_reqwest(), url)
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), length = bytes.len(), "Response received");

        if !status.is_success() {
            let body = sanitize_for_log(&String::from_utf8_lossy(&bytes));
            error!(status = status.as_u16(), body = %body, "Control plane request failed");
            return Err(ProviderError::Http {
                status: status.as_u16(),
                method,
                url: url.to_string(),
                body,
            });
        }
        Ok(bytes.to_vec())
    }
}

/// Normalize a control-plane address into a base URL.
///
/// A bare host (optionally with port) gets the `https` scheme; explicit
/// `http://` and `https://` URLs are kept. Trailing slashes are removed.
pub fn base_url(control_plane: &str) -> Result<String, ProviderError> {
    parse_base(control_plane).map(|url| without_trailing_slash(&url))
}

fn without_trailing_slash(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

fn parse_base(control_plane: &str) -> Result<Url, ProviderError> {
    let trimmed = control_plane.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ProviderError::Configuration(
            "control plane address is empty".to_string(),
        ));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&candidate).map_err(|e| {
        ProviderError::Configuration(format!(
            "invalid control plane address '{}': {}",
            control_plane, e
        ))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ProviderError::Configuration(format!(
            "control plane address '{}' must be an http(s) host",
            control_plane
        )));
    }
    Ok(url)
}

fn build_http(tls_skip_verify: bool) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(tls_skip_verify)
        .build()
        .map_err(|e| ProviderError::Configuration(format!("failed to create HTTP client: {}", e)))
}

async fn fetch_token(
    http: &reqwest::Client,
    url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, ProviderError> {
    let response = http
        .post(url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?;
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(ProviderError::Http {
            status: status.as_u16(),
            method: HttpMethod::Post,
            url: url.to_string(),
            body: sanitize_for_log(&String::from_utf8_lossy(&bytes)),
        });
    }
    let token: TokenResponse = serde_json::from_slice(&bytes)?;
    Ok(token.access_token)
}

/// Truncate a response body and drop control characters.
fn sanitize_for_log(body: &str) -> String {
    let cleaned: String = body
        .chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect();
    let total = cleaned.chars().count();
    if total > MAX_LOG_BODY_LENGTH {
        let head: String = cleaned.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} chars total]", head, total)
    } else {
        cleaned
    }
}
