// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Document shapes and the resolved system model.
//!
//! [`document`] mirrors the YAML files as deserialized, [`port`] resolves
//! port IDs, and [`resolved`] holds the merged model the transport layers
//! run against.

pub mod document;
pub mod port;
pub mod resolved;

pub use document::{
    BusEntry, DeviceEntry, InterfaceDocument, MessageSection, PortEntry, ServiceSection,
    SystemDocument,
};
pub use port::{assign_port_ids, Port, PortDirection};
pub use resolved::{
    CanBusInfo, DeviceInfo, InterfaceInfo, MessagePorts, ServicePorts, SystemModel,
};
