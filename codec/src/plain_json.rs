//! Strict plain-JSON encoding
//!
//! For peers that only speak JSON. Values without a JSON form fail to
//! encode instead of being coerced.

use crate::{Codec, CodecError, Value};

/// Codec restricted to JSON-representable values
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&value.to_json()?)?)
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        Ok(Value::from_json(serde_json::from_str(raw)?))
    }
}
