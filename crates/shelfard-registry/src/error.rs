//! Registry error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid schema name '{0}': use lowercase letters, digits, '_' or '-'")]
    InvalidName(String),

    #[error("No snapshots registered for '{0}'")]
    NotFound(String),

    #[error("Snapshot '{name}' has no version {version}")]
    VersionNotFound { name: String, version: u32 },

    #[error("Snapshot '{name}' version {version} already exists")]
    VersionExists { name: String, version: u32 },

    #[error("Corrupt snapshot at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Invalid schema: {0}")]
    Schema(#[from] shelfard_core::SchemaError),

    #[error("Registry IO error: {0}")]
    Io(#[from] std::io::Error),
}
