//! Schema inference from decoded JSON
//!
//! Builds a typed column tree from one or more JSON samples. Values observed at the
//! same position (array elements, repeated samples) are merged before typing, so the
//! result does not depend on which element happens to come first beyond key order.

use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use shelfard_core::{Column, ColumnType, InferenceConfig, SchemaError, ARRAY_ELEMENT};

use crate::compat::common_supertype;

/// Schema inference engine
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonInference {
    options: InferenceConfig,
}

impl JsonInference {
    /// Create an inference engine with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inference engine with explicit options
    pub fn with_options(options: InferenceConfig) -> Self {
        Self { options }
    }

    /// Infer the root column of a single payload
    pub fn infer(&self, value: &Value) -> Column {
        self.infer_merged("", &[value], false)
    }

    /// Infer one root column covering every sample.
    ///
    /// Keys missing from some samples become nullable.
    pub fn infer_samples<'a, I>(&self, samples: I) -> Column
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let samples: Vec<&Value> = samples.into_iter().collect();
        self.infer_merged("", &samples, false)
    }

    /// Decode raw bytes and infer
    pub fn infer_from_slice(&self, bytes: &[u8]) -> Result<Column, SchemaError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| SchemaError::Inference(e.to_string()))?;
        Ok(self.infer(&value))
    }

    fn infer_merged(&self, name: &str, values: &[&Value], absent_somewhere: bool) -> Column {
        let nullable = absent_somewhere || values.iter().any(|v| v.is_null());
        let present: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();

        let column_type = if present.is_empty() {
            ColumnType::NullUnknown
        } else if present.iter().all(|v| v.is_object()) {
            let objects: Vec<&Map<String, Value>> = present.iter().filter_map(|v| v.as_object()).collect();
            return self.infer_object(name, &objects).with_nullable(nullable);
        } else if present.iter().all(|v| v.is_array()) {
            let elements: Vec<&Value> = present
                .iter()
                .filter_map(|v| v.as_array())
                .flatten()
                .collect();
            let element = self.infer_merged(ARRAY_ELEMENT, &elements, false);
            return Column::array_of(name, element).with_nullable(nullable);
        } else {
            self.infer_scalars(&present)
        };

        Column::new(name, column_type).with_nullable(nullable)
    }

    fn infer_object(&self, name: &str, objects: &[&Map<String, Value>]) -> Column {
        // First-seen key order across all samples
        let mut keys: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for object in objects {
            for key in object.keys() {
                if seen.insert(key.as_str()) {
                    keys.push(key);
                }
            }
        }

        let fields = keys
            .into_iter()
            .map(|key| {
                let values: Vec<&Value> = objects.iter().filter_map(|o| o.get(key)).collect();
                let absent = values.len() < objects.len();
                self.infer_merged(key, &values, absent)
            })
            .collect();

        Column::struct_of(name, fields)
    }

    /// Scalars widen to their common supertype; a mix without one (or a mix of
    /// scalars and containers) carries no usable type information.
    fn infer_scalars(&self, values: &[&Value]) -> ColumnType {
        let mut merged: Option<ColumnType> = None;

        for value in values {
            let Some(observed) = self.scalar_type(value) else {
                return ColumnType::NullUnknown;
            };
            merged = match merged {
                None => Some(observed),
                Some(current) => match common_supertype(&current, &observed) {
                    Some(widened) => Some(widened),
                    None => return ColumnType::NullUnknown,
                },
            };
        }

        merged.unwrap_or(ColumnType::NullUnknown)
    }

    fn scalar_type(&self, value: &Value) -> Option<ColumnType> {
        match value {
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Number(n) => Some(number_type(n)),
            Value::String(s) => Some(self.string_type(s)),
            Value::Null => Some(ColumnType::NullUnknown),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The observed length stands in for a maximum. One sample is not a bound.
    fn string_type(&self, s: &str) -> ColumnType {
        if self.options.string_lengths {
            let len = u32::try_from(s.chars().count()).unwrap_or(u32::MAX);
            ColumnType::bounded_string(len)
        } else {
            ColumnType::string()
        }
    }
}

/// Infer the root column of a payload with default options
pub fn infer(value: &Value) -> Column {
    JsonInference::new().infer(value)
}

/// Infer the root column of a payload
pub fn infer_with(value: &Value, options: InferenceConfig) -> Column {
    JsonInference::with_options(options).infer(value)
}

/// Map a JSON number to the narrowest fitting numeric type
pub fn number_type(n: &Number) -> ColumnType {
    if let Some(i) = n.as_i64() {
        if i32::try_from(i).is_ok() {
            ColumnType::Int
        } else {
            ColumnType::BigInt
        }
    } else if n.is_u64() {
        ColumnType::BigInt
    } else {
        match n.as_f64() {
            Some(f) => float_type(f),
            None => ColumnType::Double,
        }
    }
}

/// FLOAT when the shortest decimal form needs at most 7 significant digits and
/// the magnitude fits a normal `f32`, otherwise DOUBLE
fn float_type(value: f64) -> ColumnType {
    const F32_DIGITS: usize = 7;

    if !value.is_finite() {
        return ColumnType::Double;
    }

    let magnitude = value.abs();
    if magnitude > f32::MAX as f64 || (magnitude != 0.0 && magnitude < f32::MIN_POSITIVE as f64) {
        return ColumnType::Double;
    }

    // `{:e}` prints the shortest round-trip mantissa, e.g. "1.25e-3"
    let formatted = format!("{:e}", magnitude);
    let mantissa = formatted.split('e').next().unwrap_or_default();
    let digits = mantissa.chars().filter(char::is_ascii_digit).count();

    if digits <= F32_DIGITS {
        ColumnType::Float
    } else {
        ColumnType::Double
    }
}
