/*
[INPUT]:  HTTP configuration (base URL, timeouts, bearer token)
[OUTPUT]: Configured reqwest client ready for gateway calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::http::{GatewayError, Result};

/// Default API gateway address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Header carrying the client-generated key of a mutating request
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the task gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http_client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl GatewayClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client against an explicit gateway address
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| GatewayError::Config(format!("build http client: {err}")))?;

        Ok(Self {
            http_client,
            base_url: normalize_base_url(base_url)?,
            auth_token: None,
        })
    }

    /// Set the bearer token sent with every request
    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.auth_token = Some(token.into());
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL from path segments; each segment is percent-encoded
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Config(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build request builder for a gateway endpoint
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint_url(segments)?;
        let mut builder = self.http_client.request(method, url);
        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| GatewayError::Config(format!("invalid auth token: {err}")))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }

    /// Send a request and decode a JSON body, mapping failures to the error taxonomy
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: &'static str,
        id: &str,
    ) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_detail(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });
            tracing::debug!(
                resource,
                id,
                status = status.as_u16(),
                message = %message,
                "gateway returned error status"
            );
            return Err(GatewayError::from_status(status, resource, id, message));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(GatewayError::from)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        return Err(GatewayError::Config(format!(
            "base URL must be hierarchical: {raw}"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// FastAPI-style `{"detail": "..."}` bodies carry the human-readable reason
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}
