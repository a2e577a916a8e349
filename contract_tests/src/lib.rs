//! # Wire Contract Tests
//!
//! This crate provides "golden" tests for the wire format to ensure it
//! doesn't drift accidentally over time. Peers built by other projects read
//! and write these exact shapes.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Expected payloads are written out as JSON
//! - **Testability first**: Contract tests fail when the wire format changes
//! - **Mechanism not policy**: Define what must be stable, not how to use it
//!
//! ## Structure
//!
//! - `envelopes`: envelope kinds, field names and channel keys
//! - `tagged_values`: codec tags for values JSON cannot express
//! - `configuration`: option names accepted from JSON

pub mod configuration;
pub mod envelopes;
pub mod tagged_values;

/// Common test helpers for contract validation
pub mod test_helpers {
    use codec::{Codec, TaggedJsonCodec, Value};
    use ipc::Envelope;

    /// Encodes an envelope and parses the text back as plain JSON
    pub fn wire_json(envelope: &Envelope) -> serde_json::Value {
        let raw = envelope
            .encode(&TaggedJsonCodec)
            .expect("Failed to encode envelope");
        serde_json::from_str(&raw).expect("Envelope is not valid JSON")
    }

    /// Decodes an envelope from golden wire JSON
    pub fn decode_wire(json: serde_json::Value) -> Envelope {
        Envelope::decode(&json.to_string(), &TaggedJsonCodec).expect("Failed to decode envelope")
    }

    /// Verifies an envelope encodes to exactly `expected`
    pub fn verify_wire_contract(envelope: &Envelope, expected: serde_json::Value) {
        let actual = wire_json(envelope);
        assert_eq!(
            actual, expected,
            "Wire format changed: expected {}, got {}",
            expected, actual
        );
    }

    /// Encodes a single value with the tagged codec as plain JSON
    pub fn tagged_json(value: &Value) -> serde_json::Value {
        let raw = TaggedJsonCodec
            .encode(value)
            .expect("Failed to encode value");
        serde_json::from_str(&raw).expect("Value is not valid JSON")
    }

    /// Decodes a single value from golden tagged JSON
    pub fn decode_tagged(json: serde_json::Value) -> Value {
        TaggedJsonCodec
            .decode(&json.to_string())
            .expect("Failed to decode value")
    }
}
