//! Mock source for testing
//!
//! Serves a predefined payload (or error) from memory. Useful for exercising the
//! snapshot/check flow without a network, and for simulating slow or failing endpoints.
//!
//! ```rust,ignore
//! let source = MockSource::new(json!({"id": 1})).with_latency(50);
//! let root = source.fetch_schema().await?;
//!
//! // Later, simulate the endpoint changing shape
//! source.set_payload(json!({"id": "a"})).await;
//! ```

use serde_json::Value;
use shelfard_core::InferenceConfig;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapter::{FetchError, SchemaSource};

/// In-memory payload source
///
/// Clones share the same payload, so a test can change what an already
/// constructed source returns.
#[derive(Clone)]
pub struct MockSource {
    response: Arc<RwLock<Result<Value, FetchError>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulated latency (milliseconds)
    latency_ms: u64,

    location: String,
    inference: InferenceConfig,
}

impl MockSource {
    /// Create a source that returns `payload`
    pub fn new(payload: Value) -> Self {
        Self::with_response(Ok(payload))
    }

    /// Create a source whose fetches fail with `error`
    pub fn failing(error: FetchError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<Value, FetchError>) -> Self {
        Self {
            response: Arc::new(RwLock::new(response)),
            fail_connection: false,
            latency_ms: 0,
            location: "mock://payload".to_string(),
            inference: InferenceConfig::default(),
        }
    }

    /// Replace the payload returned by subsequent fetches
    pub async fn set_payload(&self, payload: Value) {
        *self.response.write().await = Ok(payload);
    }

    /// Make subsequent fetches fail
    pub async fn set_error(&self, error: FetchError) {
        *self.response.write().await = Err(error);
    }

    /// Fail `test_connection` regardless of the configured payload
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Delay every operation by `latency_ms` milliseconds
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl SchemaSource for MockSource {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn describe(&self) -> String {
        self.location.clone()
    }

    fn inference(&self) -> InferenceConfig {
        self.inference
    }

    async fn fetch_payload(&self) -> Result<Value, FetchError> {
        self.simulate_latency().await;
        self.response.read().await.clone()
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.simulate_latency().await;

        if self.fail_connection {
            Err(FetchError::NetworkError("Simulated connection failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelfard_core::ColumnType;

    #[tokio::test]
    async fn test_mock_source_infers_payload() {
        let source = MockSource::new(json!({"id": 1, "name": "Ada"}));

        let root = source.fetch_schema().await.unwrap();
        let names: Vec<&str> = root.children().iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(root.children()[1].column_type, ColumnType::bounded_string(3));
    }

    #[tokio::test]
    async fn test_mock_source_respects_inference_options() {
        let source = MockSource::new(json!({"name": "Ada"}))
            .with_inference(InferenceConfig { string_lengths: false });

        let root = source.fetch_schema().await.unwrap();
        assert_eq!(root.children()[0].column_type, ColumnType::string());
    }

    #[tokio::test]
    async fn test_mock_source_error() {
        let source = MockSource::failing(FetchError::HttpStatus { status: 500, url: "mock://".to_string() });

        assert!(matches!(
            source.fetch_schema().await,
            Err(FetchError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_source_clones_share_payload() {
        let source = MockSource::new(json!({"id": 1}));
        let clone = source.clone();

        clone.set_payload(json!({"id": 1, "email": "a@b.co"})).await;

        let root = source.fetch_schema().await.unwrap();
        assert_eq!(root.children().len(), 2);

        clone.set_error(FetchError::NetworkError("down".to_string())).await;
        assert!(source.fetch_payload().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_source_connection() {
        assert!(MockSource::new(json!({})).test_connection().await.is_ok());

        let source = MockSource::new(json!({})).with_connection_failure();
        assert!(matches!(source.test_connection().await, Err(FetchError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_mock_source_latency() {
        let source = MockSource::new(json!({})).with_latency(20);

        let start = std::time::Instant::now();
        source.fetch_payload().await.unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(20));
    }

    #[test]
    fn test_mock_source_name() {
        let source = MockSource::new(json!({})).with_location("fixture://users");
        assert_eq!(source.name(), "Mock");
        assert_eq!(source.describe(), "fixture://users");
    }
}
