// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # canport
//!
//! Publish/subscribe messaging over raw CAN bus for multi-node embedded
//! systems.
//!
//! A system is described declaratively: topology YAML files say which
//! devices sit on which buses, interface YAML files say which named ports
//! each device type exposes. Composition merges those documents into one
//! validated model, and the transmit/receive paths move single-frame
//! messages between nodes using a 29-bit CAN identifier that encodes
//! priority, port and addressing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use canport::{
//!     compose, render_report, CodecRegistry, LoopbackTransport, Priority, Receiver,
//!     Transmitter, Value,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // One codec per wire type referenced by the interface documents
//!     let mut codecs = CodecRegistry::new();
//!     // codecs.register("motors/Command", Arc::new(MotorCommandCodec));
//!
//!     let result = compose(
//!         &[PathBuf::from("config/systems")],
//!         &[PathBuf::from("config/interfaces")],
//!         &codecs,
//!     );
//!     if !result.success() {
//!         eprintln!("{}", render_report(&result));
//!         return Err("composition failed".into());
//!     }
//!     let model = Arc::new(result.model);
//!     let codecs = Arc::new(codecs);
//!
//!     // Swap in a SocketCAN-backed transport on the real vehicle
//!     let transport = LoopbackTransport::new();
//!
//!     // Command a device: encode for its receive port, address its node
//!     let mut tx = Transmitter::new(Arc::clone(&model), Arc::clone(&codecs), &transport, 0)?;
//!     tx.send("motor0", "cmd", &Value::from(128u64), Priority::Nominal, false)?;
//!
//!     // Listen to everything addressed to node 0 or broadcast
//!     let mut rx = Receiver::new(
//!         model,
//!         codecs,
//!         Arc::new(transport),
//!         0,
//!         |system, device, port, value| {
//!             println!("[{system}] {device}/{} = {value:?}", port.name);
//!         },
//!     );
//!     rx.start()?;
//!     // ... run ...
//!     rx.stop()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   systems/*.yaml        interfaces/*.yaml
//!         |                      |
//!         +----------+-----------+
//!                    v
//!               compose()  <---  CodecRegistry (one codec per wire type)
//!                    |
//!                    v
//!              SystemModel  (buses, devices, resolved port IDs)
//!               /         \
//!              v           v
//!        Transmitter    Receiver (reader thread per bus + dispatch thread)
//!              \           /
//!               v         v
//!         BusTransport / BusHandle
//!       (CAN adapters, LoopbackTransport, ...)
//! ```
//!
//! ## Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`CodecRegistry`] | Maps wire type names to payload codecs |
//! | [`ComposeResult`] | Composed model plus every error found |
//! | [`SystemModel`] | Immutable merged topology with resolved ports |
//! | [`Transmitter`] | Encodes values and puts frames on the wire |
//! | [`Receiver`] | Per-bus readers feeding one ordered callback |
//! | [`CanId`] / [`FrameHeader`] | Wire-level bit packing |
//!
//! ## Modules Overview
//!
//! - [`config`]: protocol constants and environment variable names
//! - [`codec`]: the [`MessageCodec`] trait and registry
//! - [`model`]: document shapes and the resolved system model
//! - [`compose`]: YAML discovery, validation and merging
//! - [`protocol`]: CAN identifier and frame header packing
//! - [`transport`]: bus abstraction, transmitter and receiver

pub mod codec;
pub mod compose;
pub mod config;
pub mod model;
pub mod protocol;
pub mod transport;

pub use codec::{CodecError, CodecRegistry, MessageCodec, Value};
pub use compose::{
    compose, compose_from_env, render_report, ComposeError, ComposeErrorKind, ComposeResult,
    EnvPathsError,
};
pub use model::{
    CanBusInfo, DeviceInfo, InterfaceInfo, Port, PortDirection, SystemModel,
};
pub use protocol::{CanId, FrameHeader, Priority};
pub use transport::{
    BusHandle, BusTransport, CanCallback, CanFrame, LoopbackTransport, Receiver, SendInfo,
    Transmitter, TransportError,
};
