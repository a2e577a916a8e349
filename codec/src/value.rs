//! The value graph carried by envelopes
//!
//! `Value` models everything a peer may put on the wire, including the
//! types plain JSON cannot express: `undefined`, non-finite numbers, big
//! integers, dates, maps with arbitrary keys and sets.

use crate::CodecError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (distinct from null)
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// IEEE 754 double, including NaN, infinities and negative zero
    Number(f64),
    /// Arbitrary-size integer (bounded to 128 bits here)
    BigInt(i128),
    /// UTF-8 string
    String(String),
    /// Point in time with millisecond precision on the wire
    Date(DateTime<Utc>),
    /// Ordered list
    Array(Vec<Value>),
    /// String-keyed record, keys in sorted order
    Object(BTreeMap<String, Value>),
    /// Map with arbitrary keys, in insertion order
    Map(Vec<(Value, Value)>),
    /// Set of values, in insertion order
    Set(Vec<Value>),
}

impl Value {
    /// Builds an object from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns a short name for the value's type
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as an integer if it has no fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                if *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a field of an object; `None` for non-objects
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|fields| fields.get(key))
    }

    /// Converts a plain JSON value
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Null,
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts to plain JSON
    ///
    /// Dates become RFC 3339 strings. Every other type JSON cannot express
    /// is rejected rather than silently coerced.
    pub fn to_json(&self) -> Result<serde_json::Value, CodecError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => json_number(*n)
                .map(serde_json::Value::Number)
                .ok_or(CodecError::NotRepresentable("non-finite number"))?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(date) => {
                serde_json::Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<Result<_, CodecError>>()?,
            ),
            other => return Err(CodecError::NotRepresentable(other.type_name())),
        })
    }
}

/// Renders a finite number, preferring an integer form when exact
pub(crate) fn json_number(n: f64) -> Option<serde_json::Number> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE && !(n == 0.0 && n.is_sign_negative()) {
        Some(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
    }
}

/// Serializes any `Serialize` type into a [`Value`]
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, CodecError> {
    Ok(Value::from_json(serde_json::to_value(value)?))
}

/// Deserializes a JSON-representable [`Value`] into a typed value
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
    Ok(serde_json::from_value(value.to_json()?)?)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
