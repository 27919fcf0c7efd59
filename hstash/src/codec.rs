//! # Value Codec
//!
//! Converts field values to their wire form on write and reconstructs typed
//! values on read.
//!
//! ## Design Principles
//!
//! 1. **Pass-Through First**: Raw bytes and text are never re-encoded.
//! 2. **Canonical JSON**: With cast mode on, every other value is stored as
//!    JSON text and parsed back on read, falling back to the text itself.
//! 3. **Absence Survives**: A field the engine did not return decodes to
//!    `None`, never to an empty value.

use bytes::Bytes;

use hstash_common::{StashError, StashResult, Value};

/// Wire representation of one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedValue {
    /// Bytes handed to the engine untouched.
    Raw(Bytes),
    /// Text, either supplied by the caller or produced by encoding.
    Text(String),
}

impl EncodedValue {
    pub fn into_bytes(self) -> Bytes {
        match self {
            EncodedValue::Raw(bytes) => bytes,
            EncodedValue::Text(text) => Bytes::from(text),
        }
    }
}

/// Encoder/decoder for field values, configured by cast mode.
#[derive(Debug, Clone, Copy)]
pub struct ValueCodec {
    cast_mode: bool,
}

impl ValueCodec {
    pub fn new(cast_mode: bool) -> Self {
        ValueCodec { cast_mode }
    }

    pub fn cast_mode(&self) -> bool {
        self.cast_mode
    }

    /// Encodes the value stored under `field`.
    ///
    /// With cast mode off, scalars are stringified the way an engine driver
    /// would and arrays/objects are rejected with `InvalidValue`.
    pub fn encode(&self, field: &str, value: Value) -> StashResult<EncodedValue> {
        let json = match value {
            Value::Raw(bytes) => return Ok(EncodedValue::Raw(bytes)),
            Value::Text(text) | Value::Json(serde_json::Value::String(text)) => {
                return Ok(EncodedValue::Text(text));
            }
            Value::Json(json) => json,
        };
        if self.cast_mode {
            return Ok(EncodedValue::Text(json.to_string()));
        }
        match json {
            serde_json::Value::Null => Ok(EncodedValue::Text(String::new())),
            serde_json::Value::Bool(flag) => Ok(EncodedValue::Text(flag.to_string())),
            serde_json::Value::Number(n) => Ok(EncodedValue::Text(n.to_string())),
            _ => Err(StashError::InvalidValue {
                field: field.to_string(),
                reason: "structured values need cast mode".to_string(),
            }),
        }
    }

    /// Decodes a value returned by the engine.
    ///
    /// `raw` returns the bytes untouched. Otherwise the bytes are read as
    /// UTF-8 (lossily) and, with cast mode on, parsed as JSON when possible.
    pub fn decode(&self, wire: Option<Bytes>, raw: bool) -> Option<Value> {
        let bytes = wire?;
        if raw {
            return Some(Value::Raw(bytes));
        }
        let text = match String::from_utf8(bytes.to_vec()) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };
        if !self.cast_mode {
            return Some(Value::Text(text));
        }
        Some(match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => Value::Json(json),
            Err(_) => Value::Text(text),
        })
    }
}

impl Default for ValueCodec {
    fn default() -> Self {
        ValueCodec::new(true)
    }
}
