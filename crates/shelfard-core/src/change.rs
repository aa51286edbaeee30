//! Change events, stable change codes and severities
//!
//! IMPORTANT: Change codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public report format.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{Column, ColumnPath, ColumnType};

/// Kind of a raw structural change
///
/// The declaration order is the tie-break order for changes sharing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    ColumnRemoved,
    ColumnAdded,
    TypeChanged,
    NullabilityTightened,
    NullabilityRelaxed,
    DefaultChanged,
    ColumnReordered,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColumnRemoved => "column_removed",
            Self::ColumnAdded => "column_added",
            Self::TypeChanged => "type_changed",
            Self::NullabilityTightened => "nullability_tightened",
            Self::NullabilityRelaxed => "nullability_relaxed",
            Self::DefaultChanged => "default_changed",
            Self::ColumnReordered => "column_reordered",
        }
    }

    /// Sort priority among changes at the same path
    pub fn priority(&self) -> u8 {
        match self {
            Self::ColumnRemoved => 0,
            Self::ColumnAdded => 1,
            Self::TypeChanged => 2,
            Self::NullabilityTightened | Self::NullabilityRelaxed => 3,
            Self::DefaultChanged => 4,
            Self::ColumnReordered => 5,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Change code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCode {
    /// A column present in the baseline is gone
    ColumnRemoved,

    /// A nullable column was added
    ColumnAdded,

    /// A non-nullable column without default was added
    RequiredColumnAdded,

    /// A non-nullable column with a default was added
    ColumnAddedWithDefault,

    /// Type changed to a wider type
    TypeWidened,

    /// Type changed to a narrower type
    TypeNarrowed,

    /// Type changed to an incompatible type family
    TypeChanged,

    /// Column no longer accepts null
    NullabilityTightened,

    /// Column now accepts null
    NullabilityRelaxed,

    /// Default value added, removed or changed
    DefaultChanged,

    /// Column moved relative to its siblings
    ColumnReordered,
}

impl ChangeCode {
    /// Get the change code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColumnRemoved => "column_removed",
            Self::ColumnAdded => "column_added",
            Self::RequiredColumnAdded => "required_column_added",
            Self::ColumnAddedWithDefault => "column_added_with_default",
            Self::TypeWidened => "type_widened",
            Self::TypeNarrowed => "type_narrowed",
            Self::TypeChanged => "type_changed",
            Self::NullabilityTightened => "nullability_tightened",
            Self::NullabilityRelaxed => "nullability_relaxed",
            Self::DefaultChanged => "default_changed",
            Self::ColumnReordered => "column_reordered",
        }
    }
}

impl fmt::Display for ChangeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Blast-radius severity of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Existing consumers keep working
    Safe,

    /// Should be reviewed, may affect consumers relying on order or defaults
    Warning,

    /// Existing consumers may fail
    Breaking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Warning => write!(f, "WARNING"),
            Self::Breaking => write!(f, "BREAKING"),
        }
    }
}

/// An unclassified structural difference between two schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawChange {
    ColumnRemoved {
        path: ColumnPath,
        column: Column,
    },
    ColumnAdded {
        path: ColumnPath,
        column: Column,
    },
    TypeChanged {
        path: ColumnPath,
        old_type: ColumnType,
        new_type: ColumnType,
    },
    NullabilityTightened {
        path: ColumnPath,
    },
    NullabilityRelaxed {
        path: ColumnPath,
    },
    DefaultChanged {
        path: ColumnPath,
        old_default: Option<serde_json::Value>,
        new_default: Option<serde_json::Value>,
    },
    ColumnReordered {
        path: ColumnPath,
        old_position: usize,
        new_position: usize,
    },
}

impl RawChange {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::ColumnRemoved { .. } => ChangeKind::ColumnRemoved,
            Self::ColumnAdded { .. } => ChangeKind::ColumnAdded,
            Self::TypeChanged { .. } => ChangeKind::TypeChanged,
            Self::NullabilityTightened { .. } => ChangeKind::NullabilityTightened,
            Self::NullabilityRelaxed { .. } => ChangeKind::NullabilityRelaxed,
            Self::DefaultChanged { .. } => ChangeKind::DefaultChanged,
            Self::ColumnReordered { .. } => ChangeKind::ColumnReordered,
        }
    }

    pub fn path(&self) -> &ColumnPath {
        match self {
            Self::ColumnRemoved { path, .. }
            | Self::ColumnAdded { path, .. }
            | Self::TypeChanged { path, .. }
            | Self::NullabilityTightened { path }
            | Self::NullabilityRelaxed { path }
            | Self::DefaultChanged { path, .. }
            | Self::ColumnReordered { path, .. } => path,
        }
    }
}

/// A raw change annotated with severity, stable code and a one-line summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedChange {
    /// Blast-radius severity
    pub severity: Severity,

    /// Raw change kind
    pub kind: ChangeKind,

    /// Stable change code
    pub code: ChangeCode,

    /// Column path the change applies to
    pub path: ColumnPath,

    /// Human-readable one-line summary
    pub summary: String,

    /// The underlying raw change
    pub change: RawChange,
}
