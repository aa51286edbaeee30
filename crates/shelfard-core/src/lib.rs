//! Shelfard Core
//!
//! Core domain model with stable, versioned types.
//! Never rename change codes - they are part of the public report format.

pub mod change;
pub mod config;
pub mod error;
pub mod report;
pub mod schema;

pub use change::{ChangeCode, ChangeKind, ClassifiedChange, RawChange, Severity};
pub use config::{Config, ConfigError, HttpConfig, InferenceConfig, RegistryConfig};
pub use error::SchemaError;
pub use report::{DriftReport, ReportSummary, ReportVersion, SnapshotRef};
pub use schema::{Column, ColumnPath, ColumnType, Schema, ARRAY_ELEMENT};
