//! Error taxonomy for the schema core

use crate::schema::ColumnPath;

/// Errors raised by the schema core
///
/// Every core operation is total over well-formed input. These errors only surface
/// precondition violations, typically on corrupt stored schemas.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Input could not be turned into a JSON value
    #[error("Inference error: {0}")]
    Inference(String),

    /// A schema violates a structural invariant (duplicate paths, bad positions)
    #[error("Schema mismatch at '{path}': {reason}")]
    SchemaMismatch { path: String, reason: String },

    /// A schema could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SchemaError {
    pub fn mismatch(path: &ColumnPath, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
