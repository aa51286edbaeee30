//! Shelfard registry - versioned schema snapshots on the local filesystem

pub mod error;
pub mod naming;
pub mod registry;

pub use error::RegistryError;
pub use naming::{schema_name_from_url, validate_name};
pub use registry::{SnapshotInfo, SnapshotRegistry};
