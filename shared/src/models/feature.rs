//! Feature Catalog Model
//!
//! Stored feature values are loosely typed JSON blobs tagged with a separate
//! value type. [`FeatureValue::decode`] turns the pair into a tagged union once,
//! at the storage boundary, so everything downstream matches on a closed type.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{AppError, ErrorCode};

/// Declared shape of a feature's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Boolean,
    Number,
    String,
    Json,
}

impl ValueType {
    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Json => "JSON",
        }
    }
}

impl FromStr for ValueType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOLEAN" => Ok(Self::Boolean),
            "NUMBER" => Ok(Self::Number),
            "STRING" => Ok(Self::String),
            "JSON" => Ok(Self::Json),
            other => Err(AppError::with_message(
                ErrorCode::UnknownValueType,
                format!("Unknown feature value type: {}", other),
            )
            .with_detail("value_type", other)),
        }
    }
}

/// Catalog definition of a capability. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Stable string identifier, e.g. `API_REQUESTS`
    pub key: String,
    pub name: String,
    pub category: String,
    pub value_type: ValueType,
}

/// A feature value, discriminated by the feature's [`ValueType`]
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Boolean(bool),
    /// `None` when the stored value does not parse as a number
    Number(Option<f64>),
    String(String),
    Json(Value),
}

impl FeatureValue {
    /// Build a typed value from the raw stored blob.
    ///
    /// Loose storage is normalized here: booleans accept `true` and `"true"`,
    /// numbers accept JSON numbers and numeric strings. Shapes that do not fit
    /// the declared type decode to the variant's "off" form.
    pub fn decode(value_type: ValueType, raw: Value) -> Self {
        match value_type {
            ValueType::Boolean => Self::Boolean(match raw {
                Value::Bool(b) => b,
                Value::String(s) => s == "true",
                _ => false,
            }),
            ValueType::Number => Self::Number(match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
                _ => None,
            }),
            ValueType::String => Self::String(match raw {
                Value::String(s) => s,
                _ => String::new(),
            }),
            ValueType::Json => Self::Json(raw),
        }
    }

    /// The value type this variant belongs to
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Boolean(_) => ValueType::Boolean,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
            Self::Json(_) => ValueType::Json,
        }
    }

    /// Natural JSON form, as persisted
    pub fn to_json(&self) -> Value {
        match self {
            Self::Boolean(b) => Value::Bool(*b),
            Self::Number(Some(n)) => number_to_json(*n),
            Self::Number(None) => Value::Null,
            Self::String(s) => Value::String(s.clone()),
            Self::Json(v) => v.clone(),
        }
    }
}

/// Integral values keep their integer form (`500`, not `500.0`)
fn number_to_json(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
