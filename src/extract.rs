//! # Declarative Value Extraction
//!
//! Pulls a named scalar out of a raw provider document using a dotted path
//! (`main.temp`, `weather[0].description`) and coerces it to the semantic
//! type the configuration asks for. Pure functions over their inputs; every
//! failure mode is a distinct error so adapters can log precisely and move
//! on to the next field.

use crate::{
    config::{FieldSpec, ValueType},
    FieldValue,
};
use serde_json::Value;
use thiserror::Error;

/// Errors from path extraction and type coercion.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A path segment (or index) is absent from the document.
    #[error("path not found: {0}")]
    NotFound(String),

    /// An index was applied to something that is not an array, or a key to
    /// something that is not an object.
    #[error("type mismatch at {0}")]
    TypeMismatch(String),

    /// The raw value exists but cannot be coerced to the configured type.
    #[error("cannot coerce {value:?} to {wanted}")]
    Coercion { value: String, wanted: &'static str },
}

/// One parsed path segment: a key, optionally followed by an array index.
#[derive(Debug, PartialEq)]
struct Segment<'a> {
    key: &'a str,
    index: Option<usize>,
}

fn parse_segment(raw: &str) -> Result<Segment<'_>, ExtractError> {
    match raw.find('[') {
        None => Ok(Segment {
            key: raw,
            index: None,
        }),
        Some(open) => {
            let close = raw
                .rfind(']')
                .ok_or_else(|| ExtractError::TypeMismatch(raw.to_string()))?;
            let index = raw[open + 1..close]
                .parse::<usize>()
                .map_err(|_| ExtractError::TypeMismatch(raw.to_string()))?;
            Ok(Segment {
                key: &raw[..open],
                index: Some(index),
            })
        }
    }
}

/// Walk `path` through `doc` and return the addressed value.
pub fn extract<'a>(doc: &'a Value, path: &str) -> Result<&'a Value, ExtractError> {
    let mut current = doc;
    for raw in path.split('.') {
        let segment = parse_segment(raw)?;

        if !segment.key.is_empty() {
            current = match current {
                Value::Object(map) => map
                    .get(segment.key)
                    .ok_or_else(|| ExtractError::NotFound(path.to_string()))?,
                _ => return Err(ExtractError::TypeMismatch(path.to_string())),
            };
        }

        if let Some(index) = segment.index {
            current = match current {
                Value::Array(items) => items
                    .get(index)
                    .ok_or_else(|| ExtractError::NotFound(path.to_string()))?,
                _ => return Err(ExtractError::TypeMismatch(path.to_string())),
            };
        }
    }
    Ok(current)
}

/// Coerce a raw document value to the configured semantic type.
///
/// `int` accepts numeric strings by parsing through `f64` and truncating;
/// `float` honours the optional `round` precision; `string` stringifies
/// scalars without JSON quoting.
pub fn coerce(raw: &Value, spec: &FieldSpec) -> Result<FieldValue, ExtractError> {
    match spec.value_type {
        ValueType::Int => {
            let n = numeric(raw)?;
            Ok(FieldValue::Int(n as i64))
        }
        ValueType::Float => {
            let mut n = numeric(raw)?;
            if let Some(places) = spec.round {
                let factor = 10f64.powi(places as i32);
                n = (n * factor).round() / factor;
            }
            Ok(FieldValue::Float(n))
        }
        ValueType::String => Ok(FieldValue::Text(stringify(raw))),
    }
}

/// Extract-and-coerce in one step, the common adapter operation.
pub fn extract_field(doc: &Value, name: &str, spec: &FieldSpec) -> Result<FieldValue, ExtractError> {
    let path = spec.path.as_deref().unwrap_or(name);
    let raw = extract(doc, path)?;
    coerce(raw, spec)
}

fn numeric(raw: &Value) -> Result<f64, ExtractError> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| coercion_error(raw, "number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| coercion_error(raw, "number")),
        _ => Err(coercion_error(raw, "number")),
    }
}

fn stringify(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coercion_error(raw: &Value, wanted: &'static str) -> ExtractError {
    ExtractError::Coercion {
        value: stringify(raw),
        wanted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_doc() -> Value {
        json!({
            "main": { "temp": 21.54, "humidity": 68 },
            "wind": { "speed": 3.6, "deg": 270 },
            "weather": [ { "description": "overcast clouds" } ],
            "sys": { "sunrise": 1700000000u64 },
            "name": "Mogilev"
        })
    }

    #[test]
    fn dotted_path_reaches_nested_scalars() {
        let doc = weather_doc();
        assert_eq!(extract(&doc, "main.humidity").unwrap(), &json!(68));
        assert_eq!(extract(&doc, "name").unwrap(), &json!("Mogilev"));
    }

    #[test]
    fn bracketed_index_selects_from_arrays() {
        let doc = weather_doc();
        assert_eq!(
            extract(&doc, "weather[0].description").unwrap(),
            &json!("overcast clouds")
        );
    }

    #[test]
    fn missing_segment_is_not_found() {
        let doc = weather_doc();
        assert!(matches!(
            extract(&doc, "main.pressure"),
            Err(ExtractError::NotFound(_))
        ));
        assert!(matches!(
            extract(&doc, "weather[3].description"),
            Err(ExtractError::NotFound(_))
        ));
    }

    #[test]
    fn index_on_non_array_is_type_mismatch() {
        let doc = weather_doc();
        assert!(matches!(
            extract(&doc, "main[0]"),
            Err(ExtractError::TypeMismatch(_))
        ));
        assert!(matches!(
            extract(&doc, "name.length"),
            Err(ExtractError::TypeMismatch(_))
        ));
    }

    #[test]
    fn float_coercion_rounds_to_configured_places() {
        let spec = FieldSpec {
            path: None,
            value_type: ValueType::Float,
            round: Some(1),
        };
        assert_eq!(coerce(&json!(21.54), &spec).unwrap(), FieldValue::Float(21.5));
        assert_eq!(
            coerce(&json!("3.67"), &spec).unwrap(),
            FieldValue::Float(3.7)
        );
    }

    #[test]
    fn int_coercion_truncates_through_float() {
        let spec = FieldSpec {
            value_type: ValueType::Int,
            ..Default::default()
        };
        assert_eq!(coerce(&json!("1013.2"), &spec).unwrap(), FieldValue::Int(1013));
        assert_eq!(coerce(&json!(68), &spec).unwrap(), FieldValue::Int(68));
    }

    #[test]
    fn non_numeric_string_is_a_coercion_error() {
        let spec = FieldSpec {
            value_type: ValueType::Float,
            ..Default::default()
        };
        assert!(matches!(
            coerce(&json!("overcast"), &spec),
            Err(ExtractError::Coercion { .. })
        ));
    }

    #[test]
    fn string_coercion_keeps_raw_text_unquoted() {
        let spec = FieldSpec::default();
        assert_eq!(
            coerce(&json!("overcast"), &spec).unwrap(),
            FieldValue::Text("overcast".into())
        );
        assert_eq!(
            coerce(&json!(42), &spec).unwrap(),
            FieldValue::Text("42".into())
        );
    }

    #[test]
    fn extract_field_defaults_path_to_name() {
        let doc = json!({ "dsw1": "12.5" });
        let spec = FieldSpec {
            value_type: ValueType::Float,
            ..Default::default()
        };
        assert_eq!(
            extract_field(&doc, "dsw1", &spec).unwrap(),
            FieldValue::Float(12.5)
        );
    }
}
