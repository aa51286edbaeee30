//! Schema types and the closed column type vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;

use crate::error::SchemaError;

/// Path segment used for the element of an array column
pub const ARRAY_ELEMENT: &str = "[]";

/// Column type vocabulary
///
/// The set is closed: every compatibility rule is an exhaustive match over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// Boolean type
    Bool,

    /// 32-bit signed integer
    Int,

    /// 64-bit integer (or larger integral value)
    #[serde(rename = "bigint")]
    BigInt,

    /// Single precision floating point
    Float,

    /// Double precision floating point
    Double,

    /// String, optionally bounded in length (characters)
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_len: Option<u32>,
    },

    /// Structured type with named, ordered fields
    Struct {
        fields: Vec<Column>,
    },

    /// Array type. The element is a column named `[]`
    Array {
        element: Box<Column>,
    },

    /// No information about the type (e.g. the value was always null)
    NullUnknown,
}

impl ColumnType {
    /// Unbounded string type
    pub fn string() -> Self {
        Self::String { max_len: None }
    }

    /// String type bounded by `max_len` characters
    pub fn bounded_string(max_len: u32) -> Self {
        Self::String { max_len: Some(max_len) }
    }

    /// Container-level shape equality.
    ///
    /// Two structs (or two arrays) always have the same shape here; their children
    /// are compared separately. Scalars must be equal.
    pub fn same_shape(&self, other: &ColumnType) -> bool {
        match (self, other) {
            (Self::Struct { .. }, Self::Struct { .. }) => true,
            (Self::Array { .. }, Self::Array { .. }) => true,
            (a, b) => a == b,
        }
    }

    /// Child columns of a container type (empty for scalars)
    pub fn children(&self) -> &[Column] {
        match self {
            Self::Struct { fields } => fields,
            Self::Array { element } => std::slice::from_ref(element.as_ref()),
            _ => &[],
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::Int => write!(f, "INT"),
            Self::BigInt => write!(f, "BIGINT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Double => write!(f, "DOUBLE"),
            Self::String { max_len: Some(n) } => write!(f, "STRING({})", n),
            Self::String { max_len: None } => write!(f, "STRING"),
            Self::Struct { .. } => write!(f, "STRUCT"),
            Self::Array { element } => write!(f, "ARRAY<{}>", element.column_type),
            Self::NullUnknown => write!(f, "NULL_UNKNOWN"),
        }
    }
}

/// A named node in a schema tree
///
/// The full path of a column is derived from its position in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Field name (the last path segment)
    pub name: String,

    /// Column type
    #[serde(flatten)]
    pub column_type: ColumnType,

    /// Whether null or absent values are permitted
    pub nullable: bool,

    /// Declared default value (database sources only).
    ///
    /// `Some(Value::Null)` is a declared `DEFAULT NULL` and is stored as `"default": null`;
    /// `None` omits the key.
    #[serde(default, deserialize_with = "declared_default", skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Ordinal among siblings at capture time
    pub position: usize,
}

impl Column {
    /// Create a non-nullable column at position 0 with no default
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            position: 0,
        }
    }

    /// Create a struct column; field positions follow the given order
    pub fn struct_of(name: impl Into<String>, fields: Vec<Column>) -> Self {
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_position(i))
            .collect();

        Self::new(name, ColumnType::Struct { fields })
    }

    /// Create an array column; the element is renamed to `[]`
    pub fn array_of(name: impl Into<String>, element: Column) -> Self {
        let mut element = element.with_position(0);
        element.name = ARRAY_ELEMENT.to_string();

        Self::new(name, ColumnType::Array { element: Box::new(element) })
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the position
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Child columns (struct fields or the array element)
    pub fn children(&self) -> &[Column] {
        self.column_type.children()
    }

    /// Find a direct child by name
    pub fn child(&self, name: &str) -> Option<&Column> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Whether this column is a struct
    pub fn is_struct(&self) -> bool {
        matches!(self.column_type, ColumnType::Struct { .. })
    }
}

/// A present `default` key is a declared default, even when its value is `null`
fn declared_default<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Ordered sequence of field names from the root to a column
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnPath(Vec<String>);

impl ColumnPath {
    /// The root path (no segments)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path (`a.b.[]`); `$` or the empty string is the root
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() || dotted == "$" {
            return Self::root();
        }
        Self::from_segments(dotted.split('.'))
    }

    /// A new path with one more segment
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether this is the root path
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "$")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

/// A named, versioned schema snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Logical identifier (registry key)
    pub name: String,

    /// Snapshot version, starting at 1
    pub version: u32,

    /// When the payload was observed
    pub captured_at: DateTime<Utc>,

    /// Root column, normally a struct
    pub root: Column,
}

impl Schema {
    /// Create a schema captured now
    pub fn new(name: impl Into<String>, version: u32, root: Column) -> Self {
        Self {
            name: name.into(),
            version,
            captured_at: Utc::now(),
            root,
        }
    }

    /// Create a version 1 schema from top-level columns
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self::new(name, 1, Column::struct_of("", columns))
    }

    /// Set the capture timestamp
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Top-level columns (children of a struct root)
    pub fn top_level_columns(&self) -> &[Column] {
        match &self.root.column_type {
            ColumnType::Struct { fields } => fields,
            _ => &[],
        }
    }

    /// Every column in tree order, paired with its path. The root comes first.
    pub fn columns(&self) -> Vec<(ColumnPath, &Column)> {
        let mut out = Vec::new();
        collect_columns(ColumnPath::root(), &self.root, &mut out);
        out
    }

    /// Total number of columns below the root
    pub fn column_count(&self) -> usize {
        self.columns().len() - 1
    }

    /// Find a column by path.
    ///
    /// A `[]` segment names the element under an array and an ordinary field under a struct.
    pub fn find(&self, path: &ColumnPath) -> Option<&Column> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Check the path uniqueness and position contiguity invariants.
    ///
    /// A struct field may be called `[]`: the parent's type decides whether a `[]`
    /// segment is an array element, so such a field never collides with one.
    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_column(&ColumnPath::root(), &self.root)
    }

    /// SHA-256 of the canonical JSON encoding of the root, hex encoded
    pub fn fingerprint(&self) -> Result<String, SchemaError> {
        let bytes = serde_json::to_vec(&self.root)
            .map_err(|e| SchemaError::Serialization(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SchemaError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON and validate
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: Schema = serde_json::from_str(json)
            .map_err(|e| SchemaError::Serialization(e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }
}

fn collect_columns<'a>(path: ColumnPath, column: &'a Column, out: &mut Vec<(ColumnPath, &'a Column)>) {
    out.push((path.clone(), column));
    for child in column.children() {
        collect_columns(path.child(child.name.clone()), child, out);
    }
}

fn validate_column(path: &ColumnPath, column: &Column) -> Result<(), SchemaError> {
    match &column.column_type {
        ColumnType::Struct { fields } => {
            let mut names = HashSet::new();
            let mut positions = vec![false; fields.len()];

            for field in fields {
                let field_path = path.child(field.name.clone());

                if !names.insert(field.name.as_str()) {
                    return Err(SchemaError::mismatch(&field_path, "duplicate column path"));
                }
                match positions.get_mut(field.position) {
                    Some(seen) if !*seen => *seen = true,
                    Some(_) => {
                        return Err(SchemaError::mismatch(
                            &field_path,
                            format!("duplicate position {}", field.position),
                        ))
                    }
                    None => {
                        return Err(SchemaError::mismatch(
                            &field_path,
                            format!("position {} outside 0..{}", field.position, fields.len()),
                        ))
                    }
                }

                validate_column(&field_path, field)?;
            }
            Ok(())
        }
        ColumnType::Array { element } => {
            let element_path = path.child(ARRAY_ELEMENT);
            if element.name != ARRAY_ELEMENT {
                return Err(SchemaError::mismatch(
                    &element_path,
                    format!("array element must be named '{}', found '{}'", ARRAY_ELEMENT, element.name),
                ));
            }
            if element.position != 0 {
                return Err(SchemaError::mismatch(&element_path, "array element position must be 0"));
            }
            validate_column(&element_path, element)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn users_schema() -> Schema {
        Schema::from_columns(
            "users",
            vec![
                Column::new("id", ColumnType::Int),
                Column::struct_of(
                    "profile",
                    vec![
                        Column::new("bio", ColumnType::bounded_string(20)).with_nullable(true),
                    ],
                ),
                Column::array_of("tags", Column::new("tag", ColumnType::string())),
            ],
        )
    }

    #[test]
    fn column_type_display() {
        assert_eq!(ColumnType::BigInt.to_string(), "BIGINT");
        assert_eq!(ColumnType::bounded_string(50).to_string(), "STRING(50)");
        assert_eq!(ColumnType::string().to_string(), "STRING");
        let array = Column::array_of("xs", Column::new("x", ColumnType::Int));
        assert_eq!(array.column_type.to_string(), "ARRAY<INT>");
    }

    #[test]
    fn columns_are_listed_parent_first() {
        let schema = users_schema();
        let paths: Vec<String> = schema.columns().iter().map(|(p, _)| p.to_string()).collect();

        assert_eq!(
            paths,
            vec!["$", "id", "profile", "profile.bio", "tags", "tags.[]"]
        );
        assert_eq!(schema.column_count(), 5);
    }

    #[test]
    fn find_by_path() {
        let schema = users_schema();
        let bio = schema.find(&ColumnPath::parse("profile.bio")).unwrap();
        assert!(bio.nullable);
        assert_eq!(bio.position, 0);
        assert!(schema.find(&ColumnPath::parse("profile.missing")).is_none());
        assert_eq!(schema.find(&ColumnPath::root()), Some(&schema.root));
    }

    #[test]
    fn path_ordering_is_segment_wise() {
        let a = ColumnPath::parse("a.z");
        let ab = ColumnPath::parse("ab");
        // "a" < "ab" at the first segment, regardless of what follows
        assert!(a < ab);
        assert!(ColumnPath::root() < a);
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        let mut schema = users_schema();
        if let ColumnType::Struct { fields } = &mut schema.root.column_type {
            fields[0].default = Some(serde_json::json!(0));
        }

        let json = schema.to_json().unwrap();
        let parsed = Schema::from_json(&json).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn declared_null_default_survives_roundtrip() {
        let schema = Schema::from_columns(
            "t",
            vec![
                Column::new("note", ColumnType::string()).with_default(serde_json::Value::Null),
                Column::new("body", ColumnType::string()),
            ],
        );

        let json = schema.to_json().unwrap();
        assert!(json.contains("\"default\": null"));

        let parsed = Schema::from_json(&json).unwrap();
        let note = parsed.find(&ColumnPath::parse("note")).unwrap();
        assert_eq!(note.default, Some(serde_json::Value::Null));
        assert_eq!(parsed.find(&ColumnPath::parse("body")).unwrap().default, None);
        assert_eq!(schema, parsed);
    }

    #[test]
    fn field_named_like_array_element_is_valid() {
        let schema = Schema::from_columns(
            "odd",
            vec![
                Column::new("[]", ColumnType::Int),
                Column::array_of("[]s", Column::new("x", ColumnType::Bool)),
            ],
        );

        schema.validate().unwrap();
        assert_eq!(
            schema.find(&ColumnPath::parse("[]")).unwrap().column_type,
            ColumnType::Int
        );
        assert_eq!(
            schema.find(&ColumnPath::parse("[]s.[]")).unwrap().column_type,
            ColumnType::Bool
        );
    }

    #[test]
    fn serialized_layout_is_flat() {
        let column = Column::new("email", ColumnType::bounded_string(12)).with_position(3);
        let value = serde_json::to_value(&column).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "name": "email",
                "type": "string",
                "max_len": 12,
                "nullable": false,
                "position": 3
            })
        );
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut schema = users_schema();
        if let ColumnType::Struct { fields } = &mut schema.root.column_type {
            fields[1].name = "id".to_string();
        }

        let err = schema.validate().unwrap_err();
        assert!(matches!(err, SchemaError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("duplicate column path"));
    }

    #[test]
    fn validate_rejects_gapped_positions() {
        let mut schema = users_schema();
        if let ColumnType::Struct { fields } = &mut schema.root.column_type {
            fields[2].position = 7;
        }

        assert!(schema.validate().is_err());
    }

    #[test]
    fn fingerprint_tracks_structure_only() {
        let a = users_schema();
        let b = users_schema().with_captured_at(Utc::now() - chrono::Duration::days(3));
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        let c = Schema::from_columns("users", vec![Column::new("id", ColumnType::BigInt)]);
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }
}
