//! Severity classification of raw changes
//!
//! A fixed rule table. Summaries are derived from the change alone.

use shelfard_core::{ChangeCode, ClassifiedChange, Column, ColumnType, RawChange, Severity};

use crate::compat::{compatibility, TypeCompatibility};

/// Assign a severity, stable code and summary to a raw change
pub fn classify(change: &RawChange) -> ClassifiedChange {
    let (severity, code) = rule(change);

    ClassifiedChange {
        severity,
        kind: change.kind(),
        code,
        path: change.path().clone(),
        summary: summarize(change),
        change: change.clone(),
    }
}

/// Classify every change, preserving order
pub fn classify_all(changes: &[RawChange]) -> Vec<ClassifiedChange> {
    changes.iter().map(classify).collect()
}

fn rule(change: &RawChange) -> (Severity, ChangeCode) {
    match change {
        RawChange::ColumnRemoved { .. } => (Severity::Breaking, ChangeCode::ColumnRemoved),
        RawChange::ColumnAdded { column, .. } => {
            if column.nullable {
                (Severity::Safe, ChangeCode::ColumnAdded)
            } else if column.default.is_some() {
                (Severity::Warning, ChangeCode::ColumnAddedWithDefault)
            } else {
                (Severity::Breaking, ChangeCode::RequiredColumnAdded)
            }
        }
        RawChange::TypeChanged { old_type, new_type, .. } => match compatibility(old_type, new_type) {
            TypeCompatibility::Identical | TypeCompatibility::Widening => {
                (Severity::Safe, ChangeCode::TypeWidened)
            }
            TypeCompatibility::Narrowing => (Severity::Breaking, ChangeCode::TypeNarrowed),
            TypeCompatibility::Incompatible => (Severity::Breaking, ChangeCode::TypeChanged),
        },
        RawChange::NullabilityTightened { .. } => (Severity::Breaking, ChangeCode::NullabilityTightened),
        RawChange::NullabilityRelaxed { .. } => (Severity::Safe, ChangeCode::NullabilityRelaxed),
        RawChange::DefaultChanged { .. } => (Severity::Warning, ChangeCode::DefaultChanged),
        RawChange::ColumnReordered { .. } => (Severity::Warning, ChangeCode::ColumnReordered),
    }
}

fn summarize(change: &RawChange) -> String {
    match change {
        RawChange::ColumnRemoved { path, column } => {
            format!("Column '{}' ({}) was removed", path, describe(column))
        }
        RawChange::ColumnAdded { path, column } => {
            if column.nullable {
                format!("Nullable column '{}' ({}) was added", path, describe(column))
            } else {
                match &column.default {
                    Some(default) => format!(
                        "Required column '{}' ({}) was added with default {}",
                        path,
                        describe(column),
                        default
                    ),
                    None => format!(
                        "Required column '{}' ({}) was added without a default",
                        path,
                        describe(column)
                    ),
                }
            }
        }
        RawChange::TypeChanged { path, old_type, new_type } => {
            let verb = match compatibility(old_type, new_type) {
                TypeCompatibility::Identical | TypeCompatibility::Widening => "widened",
                TypeCompatibility::Narrowing => "narrowed",
                TypeCompatibility::Incompatible => "changed incompatibly",
            };
            format!("Column '{}' type {} from {} to {}", path, verb, old_type, new_type)
        }
        RawChange::NullabilityTightened { path } => {
            format!("Column '{}' no longer accepts null", path)
        }
        RawChange::NullabilityRelaxed { path } => format!("Column '{}' now accepts null", path),
        RawChange::DefaultChanged { path, old_default, new_default } => format!(
            "Column '{}' default changed from {} to {}",
            path,
            literal(old_default.as_ref()),
            literal(new_default.as_ref())
        ),
        RawChange::ColumnReordered { path, old_position, new_position } => format!(
            "Column '{}' moved from position {} to {}",
            path, old_position, new_position
        ),
    }
}

fn describe(column: &Column) -> String {
    match &column.column_type {
        ColumnType::Struct { fields } if fields.len() == 1 => "STRUCT with 1 field".to_string(),
        ColumnType::Struct { fields } => format!("STRUCT with {} fields", fields.len()),
        other => other.to_string(),
    }
}

fn literal(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}
