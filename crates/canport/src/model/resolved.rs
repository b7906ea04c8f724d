// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The composed, immutable system model.
//!
//! Composition turns validated documents into this structure once; the
//! transmit and receive paths only ever read it, so everything is shared
//! through `Arc` without interior locks.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::document::{InterfaceDocument, PortEntry};
use crate::model::port::{assign_port_ids, Port, PortDirection};

// ============================================================================
// Interfaces
// ============================================================================

/// Message ports of an interface, keyed by port name.
#[derive(Debug, Clone, Default)]
pub struct MessagePorts {
    pub receive: HashMap<String, Port>,
    pub transmit: HashMap<String, Port>,
}

/// Service ports of an interface, keyed by port name.
#[derive(Debug, Clone, Default)]
pub struct ServicePorts {
    pub client: HashMap<String, Port>,
    pub server: HashMap<String, Port>,
}

/// A fully resolved device interface: every port has its final port ID.
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    pub name: String,
    pub version: String,
    /// Document this interface was loaded from.
    pub file_path: PathBuf,
    /// Key devices reference this interface by (the file stem).
    pub type_key: String,
    pub messages: MessagePorts,
    pub services: ServicePorts,
    /// Every wire type named by any port table, deduplicated.
    pub wire_types: BTreeSet<String>,
}

impl InterfaceInfo {
    /// Resolve a validated document into an interface, assigning port IDs
    /// independently per direction.
    pub fn from_document(
        doc: &InterfaceDocument,
        file_path: &Path,
        type_key: &str,
    ) -> Result<Self, String> {
        let resolve = |entries: &[PortEntry]| -> Result<HashMap<String, Port>, String> {
            let ports = assign_port_ids(entries)?;
            Ok(ports
                .into_iter()
                .map(|port| (port.name.clone(), port))
                .collect())
        };

        let messages = MessagePorts {
            receive: resolve(doc.receive_entries())
                .map_err(|e| format!("receive table of '{}': {e}", doc.name))?,
            transmit: resolve(doc.transmit_entries())
                .map_err(|e| format!("transmit table of '{}': {e}", doc.name))?,
        };
        let services = ServicePorts {
            client: resolve(doc.client_entries())
                .map_err(|e| format!("client table of '{}': {e}", doc.name))?,
            server: resolve(doc.server_entries())
                .map_err(|e| format!("server table of '{}': {e}", doc.name))?,
        };

        let mut wire_types = BTreeSet::new();
        for table in [
            doc.receive_entries(),
            doc.transmit_entries(),
            doc.client_entries(),
            doc.server_entries(),
        ] {
            for entry in table {
                wire_types.insert(entry.port_type.clone());
            }
        }

        Ok(Self {
            name: doc.name.clone(),
            version: doc.version.clone(),
            file_path: file_path.to_path_buf(),
            type_key: type_key.to_string(),
            messages,
            services,
            wire_types,
        })
    }

    fn table(&self, direction: PortDirection) -> &HashMap<String, Port> {
        match direction {
            PortDirection::Receive => &self.messages.receive,
            PortDirection::Transmit => &self.messages.transmit,
            PortDirection::Client => &self.services.client,
            PortDirection::Server => &self.services.server,
        }
    }

    /// Look up a port by name in one direction's table.
    #[must_use]
    pub fn port(&self, direction: PortDirection, name: &str) -> Option<&Port> {
        self.table(direction).get(name)
    }

    /// Look up a port by resolved ID in one direction's table.
    #[must_use]
    pub fn port_by_id(&self, direction: PortDirection, port_id: u16) -> Option<&Port> {
        self.table(direction).values().find(|p| p.port_id == port_id)
    }

    /// All ports carrying `port_id`, across every direction. IDs are unique
    /// within one direction but may repeat across directions.
    #[must_use]
    pub fn ports_with_id(&self, port_id: u16) -> Vec<(PortDirection, &Port)> {
        let directions = [
            PortDirection::Receive,
            PortDirection::Transmit,
            PortDirection::Client,
            PortDirection::Server,
        ];
        directions
            .into_iter()
            .flat_map(|direction| {
                self.table(direction)
                    .values()
                    .filter(move |p| p.port_id == port_id)
                    .map(move |p| (direction, p))
            })
            .collect()
    }
}

// ============================================================================
// Devices and buses
// ============================================================================

/// One device instance on one bus.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    /// Node ID, unique per bus.
    pub node_id: u8,
    /// Name of the topology document that declared this device.
    pub source_system: String,
    /// Raw `device_type` reference from the topology document.
    pub device_type: String,
    pub bus_name: String,
    /// Resolved interface, absent when resolution failed during composition.
    pub interface: Option<Arc<InterfaceInfo>>,
}

impl DeviceInfo {
    /// Sorted port names of one direction, empty when the interface is
    /// unresolved.
    #[must_use]
    pub fn port_names(&self, direction: PortDirection) -> Vec<String> {
        let mut names: Vec<String> = self
            .interface
            .as_ref()
            .map(|interface| interface.table(direction).keys().cloned().collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

/// One physical bus with everything attached to it.
#[derive(Debug, Clone)]
pub struct CanBusInfo {
    pub name: String,
    pub rate: u32,
    pub devices: Vec<Arc<DeviceInfo>>,
}

// ============================================================================
// System model
// ============================================================================

/// The merged view over every composed topology document.
#[derive(Debug, Clone, Default)]
pub struct SystemModel {
    /// Name of the first composed topology document, empty when none loaded.
    pub name: String,
    pub buses: Vec<CanBusInfo>,
    /// Devices by name. Names are unique across the whole model.
    pub devices: HashMap<String, Arc<DeviceInfo>>,
    /// Interfaces by type key.
    pub interfaces: HashMap<String, Arc<InterfaceInfo>>,
}

impl SystemModel {
    #[must_use]
    pub fn device(&self, name: &str) -> Option<&Arc<DeviceInfo>> {
        self.devices.get(name)
    }

    /// Find the device at `node_id` on `bus_name`. A node ID identifies a
    /// device only together with its bus.
    #[must_use]
    pub fn device_by_node(&self, bus_name: &str, node_id: u8) -> Option<&Arc<DeviceInfo>> {
        self.bus(bus_name)?
            .devices
            .iter()
            .find(|d| d.node_id == node_id)
    }

    #[must_use]
    pub fn bus(&self, name: &str) -> Option<&CanBusInfo> {
        self.buses.iter().find(|b| b.name == name)
    }

    /// Interface of the named device on the named bus, if both exist and the
    /// interface resolved.
    #[must_use]
    pub fn interface_for_device(&self, bus_name: &str, device_name: &str) -> Option<&Arc<InterfaceInfo>> {
        let device = self.bus(bus_name)?.devices.iter().find(|d| d.name == device_name)?;
        device.interface.as_ref()
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buses.is_empty() && self.devices.is_empty()
    }
}
