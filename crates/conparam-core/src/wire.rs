// # Wire Codec
//
// Every message is one UDP datagram carrying a UTF-8 JSON object.
//
// ## Messages
//
// - Announcement (client -> backend, once): `{"__namespace__": "<namespace>"}`
// - Update (client -> backend, per write): `{"<name>": <value>}`
// - Update (backend -> client, any time): `{"<name>": <value>, ...}`
//
// There is no framing beyond the datagram boundary.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Key used to announce the client's namespace to the backend
pub const NAMESPACE_KEY: &str = "__namespace__";

/// Receive buffer size, and the default bound on outbound payloads
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Whether `name` is reserved by the protocol and cannot be a parameter
pub fn is_reserved(name: &str) -> bool {
    name == NAMESPACE_KEY
}

/// Encode the one-time namespace announcement
pub fn encode_announcement(namespace: &str) -> Result<Vec<u8>> {
    let mut message = Map::with_capacity(1);
    message.insert(NAMESPACE_KEY.to_string(), Value::String(namespace.to_string()));
    Ok(serde_json::to_vec(&message)?)
}

/// Encode a single-parameter update
pub fn encode_update(name: &str, value: &Value) -> Result<Vec<u8>> {
    let mut message = Map::with_capacity(1);
    message.insert(name.to_string(), value.clone());
    Ok(serde_json::to_vec(&message)?)
}

/// Decode an inbound update into a flat name -> value mapping
///
/// # Errors
///
/// - [`Error::Utf8`]: payload is not UTF-8 text
/// - [`Error::Json`]: payload is not valid JSON
/// - [`Error::InvalidInput`]: top-level value is not an object
pub fn decode_update(bytes: &[u8]) -> Result<Map<String, Value>> {
    let text = std::str::from_utf8(bytes)?;
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_input(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
