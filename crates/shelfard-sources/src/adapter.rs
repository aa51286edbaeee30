//! Source trait for fetching JSON payloads to snapshot

use serde_json::Value;
use shelfard_core::{Column, InferenceConfig};
use shelfard_engine::JsonInference;

/// Errors that can occur when fetching payloads
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Anything that can produce a JSON payload whose shape should be tracked
#[async_trait::async_trait]
pub trait SchemaSource: Send + Sync {
    /// Source kind (e.g., "REST")
    fn name(&self) -> &'static str;

    /// Human-readable location of the payload, such as its URL
    fn describe(&self) -> String;

    /// Inference options applied by [`SchemaSource::fetch_schema`]
    fn inference(&self) -> InferenceConfig {
        InferenceConfig::default()
    }

    /// Fetch and decode the current payload
    async fn fetch_payload(&self) -> Result<Value, FetchError>;

    /// Fetch the payload and infer its root column
    async fn fetch_schema(&self) -> Result<Column, FetchError> {
        let payload = self.fetch_payload().await?;
        let root = JsonInference::with_options(self.inference()).infer(&payload);

        tracing::debug!(
            source = self.name(),
            target = %self.describe(),
            top_level = root.children().len(),
            "inferred schema from payload"
        );

        Ok(root)
    }

    /// Check that the source is reachable without inferring anything
    async fn test_connection(&self) -> Result<(), FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let status = FetchError::HttpStatus { status: 503, url: "https://api.example.com/users".to_string() };
        assert_eq!(status.to_string(), "HTTP 503 from https://api.example.com/users");

        let auth = FetchError::AuthenticationError("HTTP 401".to_string());
        assert_eq!(auth.to_string(), "Authentication failed: HTTP 401");
    }
}
