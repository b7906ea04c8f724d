// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bus access and the transmit/receive paths.
//!
//! The composed model says who sits where; this module moves frames. Bus
//! I/O hides behind [`BusTransport`]/[`BusHandle`] so the same transmit and
//! receive code runs against real CAN adapters and against the in-process
//! [`LoopbackTransport`] used in tests.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::codec::CodecError;
use crate::model::SystemModel;

mod loopback;
mod receiver;
mod transmitter;

pub use loopback::LoopbackTransport;
pub use receiver::{CanCallback, Receiver};
pub use transmitter::{SendInfo, Transmitter};

// ============================================================================
// Frames
// ============================================================================

/// One raw CAN frame as it crosses a [`BusHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// True for 29-bit extended identifiers. The protocol only ever sends
    /// extended frames; standard frames from other traffic are ignored on
    /// receive.
    pub extended: bool,
    pub arbitration_id: u32,
    pub data: Vec<u8>,
}

impl CanFrame {
    /// An extended-identifier frame, the only kind this protocol emits.
    #[must_use]
    pub fn extended(arbitration_id: u32, data: Vec<u8>) -> Self {
        Self {
            extended: true,
            arbitration_id,
            data,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure on the transmit or receive path.
#[derive(Debug)]
pub enum TransportError {
    /// The named device is not in the composed model.
    UnknownDevice(String),
    /// The device exists but has no such port in the relevant direction.
    UnknownPort { device: String, port: String },
    /// The encoded payload does not fit a single frame.
    PayloadTooLarge { len: usize, max: usize },
    /// Payload encoding or codec lookup failed.
    Codec(CodecError),
    /// The underlying bus rejected an operation.
    BusIo(String),
    /// Operation not valid in the current lifecycle state.
    InvalidState(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::UnknownDevice(name) => write!(f, "unknown device '{name}'"),
            TransportError::UnknownPort { device, port } => {
                write!(f, "device '{device}' has no port '{port}' for this operation")
            }
            TransportError::PayloadTooLarge { len, max } => {
                write!(f, "encoded payload is {len} bytes, limit is {max}")
            }
            TransportError::Codec(e) => write!(f, "codec error: {e}"),
            TransportError::BusIo(msg) => write!(f, "bus I/O error: {msg}"),
            TransportError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for TransportError {
    fn from(e: CodecError) -> Self {
        TransportError::Codec(e)
    }
}

// ============================================================================
// Bus abstraction
// ============================================================================

/// Factory for bus connections, one per composed bus.
pub trait BusTransport: Send + Sync {
    /// Open a connection to `bus_name` at `rate` bits per second.
    fn open(&self, bus_name: &str, rate: u32) -> Result<Box<dyn BusHandle>, TransportError>;
}

/// One open bus connection. Handles are single-owner; each worker thread
/// drives exactly one.
pub trait BusHandle: Send {
    fn send(&mut self, frame: &CanFrame) -> Result<(), TransportError>;

    /// Blocking read with a timeout. `Ok(None)` means the timeout elapsed
    /// without traffic.
    fn recv(&mut self, timeout: Duration) -> Result<Option<CanFrame>, TransportError>;

    /// Release the connection. Further sends may fail; calling twice is
    /// harmless.
    fn close(&mut self);
}

/// Open a handle for every bus in the model, keyed by bus name.
///
/// All-or-nothing: when any bus fails to open, handles opened so far are
/// closed and the error is returned.
pub fn open_system_buses(
    transport: &dyn BusTransport,
    model: &SystemModel,
) -> Result<HashMap<String, Box<dyn BusHandle>>, TransportError> {
    let mut handles: HashMap<String, Box<dyn BusHandle>> = HashMap::new();
    for bus in &model.buses {
        match transport.open(&bus.name, bus.rate) {
            Ok(handle) => {
                handles.insert(bus.name.clone(), handle);
            }
            Err(e) => {
                for handle in handles.values_mut() {
                    handle.close();
                }
                return Err(e);
            }
        }
    }
    Ok(handles)
}
