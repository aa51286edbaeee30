//! Shelfard engine - schema inference, diffing and classification
//!
//! This crate implements the drift detection core:
//! - JSON schema inference
//! - Type compatibility rules
//! - Structural diff engine
//! - Severity classification and report aggregation
//!
//! Everything here is pure: no I/O, no shared state.

pub mod classifier;
pub mod compat;
pub mod diff;
pub mod inference;

pub use classifier::{classify, classify_all};
pub use compat::{compatibility, is_incompatible, is_narrowing, is_widening, TypeCompatibility};
pub use diff::{diff, try_diff};
pub use inference::{infer, infer_with, JsonInference};

use shelfard_core::{DriftReport, Schema, SchemaError, SnapshotRef};

/// Validate, diff and classify a baseline/current pair into a report
pub fn check(baseline: &Schema, current: &Schema) -> Result<DriftReport, SchemaError> {
    let raw = try_diff(baseline, current)?;
    let changes = classify_all(&raw);

    tracing::debug!(
        schema = %baseline.name,
        baseline_version = baseline.version,
        current_version = current.version,
        changes = changes.len(),
        "compared schema snapshots"
    );

    Ok(DriftReport::from_changes(
        baseline.name.clone(),
        snapshot_ref(baseline)?,
        snapshot_ref(current)?,
        changes,
    ))
}

fn snapshot_ref(schema: &Schema) -> Result<SnapshotRef, SchemaError> {
    Ok(SnapshotRef {
        version: schema.version,
        captured_at: schema.captured_at.to_rfc3339(),
        fingerprint: schema.fingerprint()?,
    })
}
