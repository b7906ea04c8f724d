// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload encoding.
//!
//! Ports declare a wire type name in their interface document
//! (`sensors/Temperature`, `actuators/MotorCommand`, ...). The application
//! registers one [`MessageCodec`] per wire type name before composing a
//! system, and composition rejects any device whose interface references a
//! name with no registered codec. Decoded values travel through the API as
//! [`Value`] trees, so codecs and callbacks agree on a common in-memory
//! representation without generated types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Dynamic value passed to codecs and delivered to receive callbacks.
pub use serde_yaml::Value;

// ============================================================================
// Errors
// ============================================================================

/// Failure raised by a codec or by codec lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// No codec registered under the requested wire type name.
    UnknownWireType(String),
    /// The value could not be serialized to payload bytes.
    Encode(String),
    /// The payload bytes could not be deserialized to a value.
    Decode(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownWireType(name) => {
                write!(f, "no codec registered for wire type '{name}'")
            }
            CodecError::Encode(msg) => write!(f, "encode failed: {msg}"),
            CodecError::Decode(msg) => write!(f, "decode failed: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

// ============================================================================
// Codec trait
// ============================================================================

/// Serializes values of one wire type to CAN payload bytes and back.
///
/// Implementations are shared across the transmit and receive paths and
/// across bus reader threads, hence the `Send + Sync` bound. Encoded output
/// must fit a single frame ([`crate::config::MAX_ENCODED_PAYLOAD_LEN`]
/// bytes); the transmit path rejects anything longer.
pub trait MessageCodec: Send + Sync {
    /// Serialize `value` to payload bytes.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// Deserialize payload bytes back to a value.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

// ============================================================================
// Registry
// ============================================================================

/// Maps wire type names to their codecs.
#[derive(Default, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn MessageCodec>>,
}

impl CodecRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `codec` under `wire_type`, replacing any previous entry.
    pub fn register(&mut self, wire_type: impl Into<String>, codec: Arc<dyn MessageCodec>) {
        self.codecs.insert(wire_type.into(), codec);
    }

    /// True when a codec is registered under `wire_type`.
    #[must_use]
    pub fn resolve(&self, wire_type: &str) -> bool {
        self.codecs.contains_key(wire_type)
    }

    #[must_use]
    pub fn get(&self, wire_type: &str) -> Option<&Arc<dyn MessageCodec>> {
        self.codecs.get(wire_type)
    }

    /// Like [`get`](Self::get) but fails with
    /// [`CodecError::UnknownWireType`].
    pub fn require(&self, wire_type: &str) -> Result<&Arc<dyn MessageCodec>, CodecError> {
        self.codecs
            .get(wire_type)
            .ok_or_else(|| CodecError::UnknownWireType(wire_type.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CodecRegistry")
            .field("wire_types", &names)
            .finish()
    }
}
