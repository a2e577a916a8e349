//! Wire envelope and event keys

use crate::{ChannelKey, EnvelopeError, ErrorDescriptor};
use codec::{Codec, Value};
use core_types::CorrelationId;
use std::fmt;

/// `type` of a broadcast envelope
pub const BROADCAST_TYPE: &str = "broadcast";

/// Prefix of the `type` of a remote call envelope
pub const FUNCTION_PREFIX: &str = "function:";

/// `type` of a remote call result envelope
pub const FUNCTION_RESULT_TYPE: &str = "functionResult";

/// Key under which listeners register
///
/// Parsed once from its string form; dispatch never re-inspects prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Fire-and-forget messages; any number of listeners
    Broadcast,
    /// Remote calls to the named function; at most one listener
    RemoteCall(String),
}

impl EventKey {
    /// Key for a remote call to `name`
    pub fn function(name: impl Into<String>) -> Self {
        EventKey::RemoteCall(name.into())
    }

    /// Parses `broadcast` or `function:<name>`
    pub fn parse(key: &str) -> Option<Self> {
        if key == BROADCAST_TYPE {
            Some(EventKey::Broadcast)
        } else {
            key.strip_prefix(FUNCTION_PREFIX)
                .map(|name| EventKey::RemoteCall(name.to_string()))
        }
    }

}

/// Renders the envelope `type` this key corresponds to
impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Broadcast => f.write_str(BROADCAST_TYPE),
            EventKey::RemoteCall(name) => write!(f, "{}{}", FUNCTION_PREFIX, name),
        }
    }
}

/// The unit exchanged over the transport
///
/// Every envelope carries `type` and `channel`; the remaining fields depend
/// on the variant. Kinds this crate does not know decode to
/// [`Envelope::Unknown`] so newer peers can add kinds without breaking
/// older ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{type: "broadcast", channel, data}`
    Broadcast { channel: ChannelKey, data: Value },
    /// `{type: "function:<name>", channel, id, args}`
    Call {
        channel: ChannelKey,
        name: String,
        id: CorrelationId,
        args: Vec<Value>,
    },
    /// `{type: "functionResult", channel, id, result?, error?}`
    Result {
        channel: ChannelKey,
        id: CorrelationId,
        outcome: Result<Value, ErrorDescriptor>,
    },
    /// Any other `type`
    Unknown { channel: ChannelKey, kind: String },
}

impl Envelope {
    pub fn broadcast(channel: ChannelKey, data: Value) -> Self {
        Envelope::Broadcast { channel, data }
    }

    pub fn call(
        channel: ChannelKey,
        name: impl Into<String>,
        id: CorrelationId,
        args: Vec<Value>,
    ) -> Self {
        Envelope::Call {
            channel,
            name: name.into(),
            id,
            args,
        }
    }

    pub fn result(
        channel: ChannelKey,
        id: CorrelationId,
        outcome: Result<Value, ErrorDescriptor>,
    ) -> Self {
        Envelope::Result {
            channel,
            id,
            outcome,
        }
    }

    /// Channel key this envelope was addressed to
    pub fn channel(&self) -> &ChannelKey {
        match self {
            Envelope::Broadcast { channel, .. }
            | Envelope::Call { channel, .. }
            | Envelope::Result { channel, .. }
            | Envelope::Unknown { channel, .. } => channel,
        }
    }

    /// The `type` field
    pub fn kind(&self) -> String {
        match self {
            Envelope::Broadcast { .. } => EventKey::Broadcast.to_string(),
            Envelope::Call { name, .. } => EventKey::function(name.as_str()).to_string(),
            Envelope::Result { .. } => FUNCTION_RESULT_TYPE.to_string(),
            Envelope::Unknown { kind, .. } => kind.clone(),
        }
    }

    /// Builds the value graph handed to the codec
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            ("type", Value::from(self.kind())),
            ("channel", Value::from(self.channel().as_str())),
        ];
        match self {
            Envelope::Broadcast { data, .. } => fields.push(("data", data.clone())),
            Envelope::Call { id, args, .. } => {
                fields.push(("id", id_to_value(id)));
                fields.push(("args", Value::Array(args.clone())));
            }
            Envelope::Result { id, outcome, .. } => {
                fields.push(("id", id_to_value(id)));
                match outcome {
                    Ok(result) => fields.push(("result", result.clone())),
                    Err(error) => fields.push(("error", error.to_value())),
                }
            }
            Envelope::Unknown { .. } => {}
        }
        Value::object(fields)
    }

    /// Validates a decoded value graph
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut fields) = value else {
            return Err(EnvelopeError::NotAnObject);
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(other) => return Err(EnvelopeError::invalid("type", other.type_name())),
            None => return Err(EnvelopeError::MissingField("type")),
        };
        let channel = match fields.remove("channel") {
            Some(Value::String(channel)) => ChannelKey::from_wire(channel),
            Some(other) => return Err(EnvelopeError::invalid("channel", other.type_name())),
            None => return Err(EnvelopeError::MissingField("channel")),
        };

        match EventKey::parse(&kind) {
            Some(EventKey::Broadcast) => {
                let data = fields.remove("data").unwrap_or_default();
                Ok(Envelope::Broadcast { channel, data })
            }
            Some(EventKey::RemoteCall(name)) => {
                let id = take_id(&mut fields)?;
                let args = match fields.remove("args") {
                    Some(Value::Array(args)) => args,
                    None | Some(Value::Undefined) => Vec::new(),
                    Some(other) => return Err(EnvelopeError::invalid("args", other.type_name())),
                };
                Ok(Envelope::Call {
                    channel,
                    name,
                    id,
                    args,
                })
            }
            None if kind == FUNCTION_RESULT_TYPE => {
                let id = take_id(&mut fields)?;
                let outcome = match fields.remove("error") {
                    Some(error) if !error.is_undefined() && !error.is_null() => {
                        Err(ErrorDescriptor::from_value(&error))
                    }
                    _ => Ok(fields.remove("result").unwrap_or_default()),
                };
                Ok(Envelope::Result {
                    channel,
                    id,
                    outcome,
                })
            }
            None => Ok(Envelope::Unknown { channel, kind }),
        }
    }

    /// Encodes to one text payload
    pub fn encode(&self, codec: &dyn Codec) -> Result<String, EnvelopeError> {
        Ok(codec.encode(&self.to_value())?)
    }

    /// Decodes and validates one text payload
    pub fn decode(raw: &str, codec: &dyn Codec) -> Result<Self, EnvelopeError> {
        Self::from_value(codec.decode(raw)?)
    }
}

fn id_to_value(id: &CorrelationId) -> Value {
    match id {
        CorrelationId::Text(text) => Value::from(text.as_str()),
        CorrelationId::Number(n) => Value::from(*n),
    }
}

fn take_id(
    fields: &mut std::collections::BTreeMap<String, Value>,
) -> Result<CorrelationId, EnvelopeError> {
    match fields.remove("id") {
        Some(Value::String(text)) => Ok(CorrelationId::Text(text)),
        Some(number @ Value::Number(_)) => number
            .as_i64()
            .map(CorrelationId::Number)
            .ok_or_else(|| EnvelopeError::invalid("id", "non-integral number")),
        Some(other) => Err(EnvelopeError::invalid("id", other.type_name())),
        None => Err(EnvelopeError::MissingField("id")),
    }
}
