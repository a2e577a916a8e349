//! Tagged JSON encoding
//!
//! JSON-native values are written as plain JSON. Everything else becomes an
//! object whose `$type` field names the tag:
//!
//! | Value | Encoding |
//! |---|---|
//! | undefined | `{"$type":"undefined"}` |
//! | NaN, ±Infinity, -0 | `{"$type":"number","value":"NaN"}` |
//! | bigint | `{"$type":"bigint","value":"123"}` |
//! | date | `{"$type":"date","value":"2024-01-01T00:00:00.000Z"}` |
//! | map | `{"$type":"map","entries":[[k,v],...]}` |
//! | set | `{"$type":"set","values":[...]}` |
//! | object with a `$type` key | `{"$type":"object","value":{...}}` |

use crate::value::json_number;
use crate::{Codec, CodecError, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as Json};

/// Field that marks a tagged object
pub const TYPE_TAG: &str = "$type";

/// Codec that preserves the full [`Value`] graph
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedJsonCodec;

impl Codec for TaggedJsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&to_tagged(value))?)
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        let json: Json = serde_json::from_str(raw)?;
        from_tagged(json)
    }
}

fn tagged(tag: &str, fields: impl IntoIterator<Item = (&'static str, Json)>) -> Json {
    let mut map = Map::new();
    map.insert(TYPE_TAG.to_string(), Json::String(tag.to_string()));
    for (key, value) in fields {
        map.insert(key.to_string(), value);
    }
    Json::Object(map)
}

fn to_tagged(value: &Value) -> Json {
    match value {
        Value::Undefined => tagged("undefined", []),
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => match json_number(*n) {
            Some(number) => Json::Number(number),
            None => tagged("number", [("value", Json::String(special_number(*n)))]),
        },
        Value::BigInt(n) => tagged("bigint", [("value", Json::String(n.to_string()))]),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(date) => tagged(
            "date",
            [(
                "value",
                Json::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            )],
        ),
        Value::Array(items) => Json::Array(items.iter().map(to_tagged).collect()),
        Value::Object(fields) => {
            let plain: Map<String, Json> = fields
                .iter()
                .map(|(k, v)| (k.clone(), to_tagged(v)))
                .collect();
            if fields.contains_key(TYPE_TAG) {
                tagged("object", [("value", Json::Object(plain))])
            } else {
                Json::Object(plain)
            }
        }
        Value::Map(entries) => tagged(
            "map",
            [(
                "entries",
                Json::Array(
                    entries
                        .iter()
                        .map(|(k, v)| Json::Array(vec![to_tagged(k), to_tagged(v)]))
                        .collect(),
                ),
            )],
        ),
        Value::Set(items) => tagged(
            "set",
            [("values", Json::Array(items.iter().map(to_tagged).collect()))],
        ),
    }
}

fn special_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        "-0".to_string()
    }
}

fn from_tagged(json: Json) -> Result<Value, CodecError> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| CodecError::malformed("number", n.to_string())),
        Json::String(s) => Ok(Value::String(s)),
        Json::Array(items) => Ok(Value::Array(
            items.into_iter().map(from_tagged).collect::<Result<_, _>>()?,
        )),
        Json::Object(mut map) => match map.remove(TYPE_TAG) {
            None => plain_object(map),
            Some(Json::String(tag)) => from_tag(&tag, map),
            Some(_) => Err(CodecError::malformed("object", "non-string type tag")),
        },
    }
}

fn plain_object(map: Map<String, Json>) -> Result<Value, CodecError> {
    Ok(Value::Object(
        map.into_iter()
            .map(|(k, v)| Ok((k, from_tagged(v)?)))
            .collect::<Result<_, CodecError>>()?,
    ))
}

fn take_string(map: &mut Map<String, Json>, tag: &'static str) -> Result<String, CodecError> {
    match map.remove("value") {
        Some(Json::String(s)) => Ok(s),
        _ => Err(CodecError::malformed(tag, "missing string value")),
    }
}

fn take_array(
    map: &mut Map<String, Json>,
    tag: &'static str,
    field: &str,
) -> Result<Vec<Json>, CodecError> {
    match map.remove(field) {
        Some(Json::Array(items)) => Ok(items),
        _ => Err(CodecError::malformed(tag, format!("missing {} array", field))),
    }
}

fn from_tag(tag: &str, mut map: Map<String, Json>) -> Result<Value, CodecError> {
    match tag {
        "undefined" => Ok(Value::Undefined),
        "number" => match take_string(&mut map, "number")?.as_str() {
            "NaN" => Ok(Value::Number(f64::NAN)),
            "Infinity" => Ok(Value::Number(f64::INFINITY)),
            "-Infinity" => Ok(Value::Number(f64::NEG_INFINITY)),
            "-0" => Ok(Value::Number(-0.0)),
            other => Err(CodecError::malformed("number", other)),
        },
        "bigint" => {
            let digits = take_string(&mut map, "bigint")?;
            digits
                .parse::<i128>()
                .map(Value::BigInt)
                .map_err(|err| CodecError::malformed("bigint", err.to_string()))
        }
        "date" => {
            let text = take_string(&mut map, "date")?;
            DateTime::parse_from_rfc3339(&text)
                .map(|date| Value::Date(date.with_timezone(&Utc)))
                .map_err(|err| CodecError::malformed("date", err.to_string()))
        }
        "map" => {
            let entries = take_array(&mut map, "map", "entries")?
                .into_iter()
                .map(|entry| match entry {
                    Json::Array(pair) if pair.len() == 2 => {
                        let mut pair = pair.into_iter();
                        let key = pair.next().unwrap_or(Json::Null);
                        let value = pair.next().unwrap_or(Json::Null);
                        Ok((from_tagged(key)?, from_tagged(value)?))
                    }
                    _ => Err(CodecError::malformed("map", "entry is not a pair")),
                })
                .collect::<Result<_, _>>()?;
            Ok(Value::Map(entries))
        }
        "set" => Ok(Value::Set(
            take_array(&mut map, "set", "values")?
                .into_iter()
                .map(from_tagged)
                .collect::<Result<_, _>>()?,
        )),
        "object" => match map.remove("value") {
            Some(Json::Object(inner)) => plain_object(inner),
            _ => Err(CodecError::malformed("object", "missing object value")),
        },
        other => Err(CodecError::UnknownTag(other.to_string())),
    }
}
