//! Type compatibility rules
//!
//! Pure, total functions over the closed type vocabulary. A type change is a
//! widening when every value valid under the old type is also valid under the
//! new one. `NULL_UNKNOWN` is the bottom of the lattice: an unknown type widens
//! to anything.

use serde::{Deserialize, Serialize};
use shelfard_core::{Column, ColumnType};

/// Relationship between an old and a new type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCompatibility {
    /// Same type
    Identical,

    /// New type accepts a superset of old values
    Widening,

    /// New type accepts a subset of old values
    Narrowing,

    /// Type family changed
    Incompatible,
}

/// Compare two types
pub fn compatibility(old: &ColumnType, new: &ColumnType) -> TypeCompatibility {
    if types_equal(old, new) {
        TypeCompatibility::Identical
    } else if is_widening(old, new) {
        TypeCompatibility::Widening
    } else if is_widening(new, old) {
        TypeCompatibility::Narrowing
    } else {
        TypeCompatibility::Incompatible
    }
}

/// True for identical types and for changes that accept a superset of values
pub fn is_widening(old: &ColumnType, new: &ColumnType) -> bool {
    match old {
        ColumnType::NullUnknown => true,
        ColumnType::Bool => matches!(new, ColumnType::Bool),
        ColumnType::Int | ColumnType::BigInt | ColumnType::Float | ColumnType::Double => {
            match (numeric_rank(old), numeric_rank(new)) {
                (Some(from), Some(to)) => from <= to,
                _ => false,
            }
        }
        ColumnType::String { max_len: old_len } => match new {
            ColumnType::String { max_len: None } => true,
            ColumnType::String { max_len: Some(new_len) } => {
                matches!(old_len, Some(old_len) if new_len >= old_len)
            }
            _ => false,
        },
        // Structs are compared field by field by the diff engine, never widened as a whole
        ColumnType::Struct { .. } => types_equal(old, new),
        ColumnType::Array { element: old_element } => match new {
            ColumnType::Array { element: new_element } => {
                is_widening(&old_element.column_type, &new_element.column_type)
            }
            _ => false,
        },
    }
}

/// The inverse direction of a widening between two different types
pub fn is_narrowing(old: &ColumnType, new: &ColumnType) -> bool {
    !types_equal(old, new) && is_widening(new, old)
}

/// Neither identical, widening nor narrowing
pub fn is_incompatible(old: &ColumnType, new: &ColumnType) -> bool {
    compatibility(old, new) == TypeCompatibility::Incompatible
}

/// Most specific type both inputs widen to, if any
pub fn common_supertype(a: &ColumnType, b: &ColumnType) -> Option<ColumnType> {
    if is_widening(a, b) {
        Some(b.clone())
    } else if is_widening(b, a) {
        Some(a.clone())
    } else {
        None
    }
}

/// Structural type equality.
///
/// Column attributes that are not part of the type (nullability, defaults,
/// positions) are ignored; struct fields are matched by name.
pub fn types_equal(a: &ColumnType, b: &ColumnType) -> bool {
    match (a, b) {
        (ColumnType::Struct { fields: fa }, ColumnType::Struct { fields: fb }) => {
            fa.len() == fb.len()
                && fa.iter().all(|f| {
                    fb.iter()
                        .find(|g| g.name == f.name)
                        .is_some_and(|g| columns_type_equal(f, g))
                })
        }
        (ColumnType::Array { element: ea }, ColumnType::Array { element: eb }) => {
            columns_type_equal(ea, eb)
        }
        _ => a == b,
    }
}

fn columns_type_equal(a: &Column, b: &Column) -> bool {
    types_equal(&a.column_type, &b.column_type)
}

/// INT < BIGINT < FLOAT < DOUBLE
fn numeric_rank(t: &ColumnType) -> Option<u8> {
    match t {
        ColumnType::Int => Some(0),
        ColumnType::BigInt => Some(1),
        ColumnType::Float => Some(2),
        ColumnType::Double => Some(3),
        _ => None,
    }
}
