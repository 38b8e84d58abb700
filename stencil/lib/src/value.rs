//! The value model threaded through path evaluation and the operation pipeline.
//!
//! Values mirror JSON but keep scalars, lists and objects distinct so that
//! every operation can check the shape of its input before acting on it.

use indexmap::IndexMap;
use serde_json::Number;

use crate::error::{RenderError, Result};

/// A resolved template value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A JSON number, kept in its original integer or float form.
    Number(Number),

    /// A string value.
    String(String),

    /// An ordered list of values.
    List(Vec<Value>),

    /// An ordered mapping of unique string keys to values.
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Short shape name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Borrow the inner string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value counts as "absent" for the `or` operation.
    ///
    /// `Null`, empty or whitespace-only strings, and empty lists are blank.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_lib::Value;
    ///
    /// assert!(Value::Null.is_blank());
    /// assert!(Value::from("   ").is_blank());
    /// assert!(!Value::from("x").is_blank());
    /// assert!(!Value::Bool(false).is_blank());
    /// ```
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// The string form of a scalar, or `None` for lists and objects.
    ///
    /// - `Null` becomes the empty string
    /// - `Bool` becomes `"true"` / `"false"`
    /// - `Number` uses its minimal decimal representation
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(format_number(n)),
            Value::String(s) => Some(s.clone()),
            Value::List(_) | Value::Object(_) => None,
        }
    }

    /// Stringify a final pipeline result for substitution into the output.
    ///
    /// Lists and objects cannot be substituted directly; a list must be
    /// reduced with `join` or `join_while` first.
    pub fn into_output(self, context: &str) -> Result<String> {
        match self {
            Value::String(s) => Ok(s),
            other => other
                .scalar_string()
                .ok_or_else(|| RenderError::type_mismatch(context, "scalar", other.kind())),
        }
    }
}

fn format_number(n: &Number) -> String {
    if n.is_f64()
        && let Some(f) = n.as_f64()
        && f.is_finite()
        && f.fract() == 0.0
        && f.abs() < 1e15
    {
        return format!("{}", f as i64);
    }
    n.to_string()
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
