//! Nested-array JSON form of a tree.
//!
//! Arrays map to sequences and everything else except objects maps to a
//! scalar. Integers that fit `i64` stay integers; other numbers become
//! floats.

use std::fmt;

use twig_tree::{ensure_sufficient_stack, Scalar, Value};

/// Why a JSON document cannot be loaded as a tree.
#[derive(Debug)]
pub enum JsonError {
    Syntax(serde_json::Error),
    /// Objects have no sequence form. `path` lists array indices from the
    /// document root.
    Object { path: Vec<usize> },
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(e) => write!(f, "invalid JSON: {e}"),
            Self::Object { path } => {
                write!(f, "objects are not supported (at $")?;
                for index in path {
                    write!(f, "[{index}]")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl std::error::Error for JsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(e) => Some(e),
            Self::Object { .. } => None,
        }
    }
}

impl From<serde_json::Error> for JsonError {
    fn from(e: serde_json::Error) -> Self {
        JsonError::Syntax(e)
    }
}

/// Parse JSON text into a value.
pub fn parse(text: &str) -> Result<Value, JsonError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    from_json(&json)
}

/// Convert a parsed JSON document.
pub fn from_json(json: &serde_json::Value) -> Result<Value, JsonError> {
    let mut path = Vec::new();
    convert(json, &mut path)
}

fn convert(json: &serde_json::Value, path: &mut Vec<usize>) -> Result<Value, JsonError> {
    Ok(match json {
        serde_json::Value::Null => Value::null(),
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => Value::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => ensure_sufficient_stack(|| {
            let mut values = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(index);
                values.push(convert(item, path)?);
                path.pop();
            }
            Ok::<_, JsonError>(Value::Seq(values))
        })?,
        serde_json::Value::Object(_) => return Err(JsonError::Object { path: path.clone() }),
    })
}

/// Convert a value back to JSON. Non-finite floats have no JSON form and
/// are written as `null`.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Scalar(scalar) => match scalar {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(i) => serde_json::Value::from(*i),
            Scalar::Float(_) => scalar
                .as_float()
                .and_then(serde_json::Number::from_f64)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Scalar::Str(s) => serde_json::Value::String(s.to_string()),
        },
        Value::Seq(items) => ensure_sufficient_stack(|| {
            serde_json::Value::Array(items.iter().map(to_json).collect())
        }),
    }
}

/// Render a value as JSON text.
pub fn render(value: &Value, pretty: bool) -> Result<String, JsonError> {
    let json = to_json(value);
    Ok(if pretty { serde_json::to_string_pretty(&json)? } else { serde_json::to_string(&json)? })
}
