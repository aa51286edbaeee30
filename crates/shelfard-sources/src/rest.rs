//! REST endpoint reader
//!
//! Issues a single GET against a JSON endpoint and hands the decoded body to inference.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let reader = RestEndpointReader::new("https://api.example.com/users/1")?
//!     .with_bearer_token(token)
//!     .with_header("X-Api-Key", "abc");
//! let root = reader.fetch_schema().await?;
//! ```

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shelfard_core::{HttpConfig, InferenceConfig};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::adapter::{FetchError, SchemaSource};

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reads the JSON body of an HTTP(S) endpoint
#[derive(Debug, Clone)]
pub struct RestEndpointReader {
    url: Url,
    bearer_token: Option<String>,
    headers: BTreeMap<String, String>,
    timeout: Duration,
    user_agent: String,
    inference: InferenceConfig,
}

impl RestEndpointReader {
    /// Create a reader for an absolute http or https URL
    pub fn new(url: &str) -> Result<Self, FetchError> {
        let parsed = Url::parse(url)
            .map_err(|e| FetchError::ConfigError(format!("Invalid URL '{}': {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::ConfigError(format!(
                "Unsupported URL scheme '{}': expected http or https",
                parsed.scheme()
            )));
        }

        Ok(Self {
            url: parsed,
            bearer_token: None,
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("shelfard/{}", env!("CARGO_PKG_VERSION")),
            inference: InferenceConfig::default(),
        })
    }

    /// Create a reader with timeout, user agent and headers from `[http]` config
    pub fn from_config(url: &str, config: &HttpConfig) -> Result<Self, FetchError> {
        Ok(Self::new(url)?
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_user_agent(config.user_agent.clone())
            .with_headers(config.headers.clone()))
    }

    /// Send `Authorization: Bearer <token>`
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Add one extra header, replacing any earlier value for the same key
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.headers.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn client(&self) -> Result<Client, FetchError> {
        Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .default_headers(self.header_map()?)
            .build()
            .map_err(|e| FetchError::ConfigError(format!("Failed to build HTTP client: {}", e)))
    }

    fn header_map(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| FetchError::ConfigError(format!("Invalid header name '{}'", key)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| FetchError::ConfigError(format!("Invalid value for header '{}'", key)))?;
            headers.insert(name, value);
        }

        if let Some(token) = &self.bearer_token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                FetchError::ConfigError("Bearer token contains characters not allowed in a header".to_string())
            })?;
            auth_value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        Ok(headers)
    }

    async fn get(&self) -> Result<reqwest::Response, FetchError> {
        let client = self.client()?;

        tracing::debug!(url = %self.url, timeout = ?self.timeout, "fetching endpoint");

        let response = client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(format!("GET {} failed: {}", self.url, e)))?;

        let status = response.status();
        tracing::debug!(url = %self.url, status = status.as_u16(), "endpoint responded");

        match status {
            s if s.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FetchError::AuthenticationError(format!(
                "HTTP {} from {}",
                status.as_u16(),
                self.url
            ))),
            _ => Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl SchemaSource for RestEndpointReader {
    fn name(&self) -> &'static str {
        "REST"
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }

    fn inference(&self) -> InferenceConfig {
        self.inference
    }

    async fn fetch_payload(&self) -> Result<Value, FetchError> {
        let response = self.get().await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkError(format!("Failed to read body from {}: {}", self.url, e)))?;

        serde_json::from_slice(&body).map_err(|e| {
            FetchError::InvalidResponse(format!("Body from {} is not valid JSON: {}", self.url, e))
        })
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.get().await.map(|_| ())
    }
}

/// Parse repeated `KEY=VALUE` arguments into a header map.
///
/// Entries without `=` or with an empty key are skipped with a warning. Keys and
/// values are trimmed; values may themselves contain `=`.
pub fn parse_header_args<S: AsRef<str>>(args: &[S]) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    for arg in args {
        let arg = arg.as_ref();
        match arg.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                headers.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => {
                tracing::warn!(header = %arg, "ignoring malformed header (expected KEY=VALUE)");
            }
        }
    }

    headers
}
