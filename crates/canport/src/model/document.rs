// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw document shapes for topology and interface YAML files.
//!
//! These structs mirror the on-disk layout one to one. Composition
//! deserializes into them, runs [`validate`](SystemDocument::validate), and
//! then builds the resolved model from the result; nothing here is looked at
//! again afterwards.

use serde::Deserialize;

use crate::config::{
    CUSTOM_PORT_ID_MAX, CUSTOM_PORT_ID_MIN, NODE_ID_MAX, NODE_ID_MIN, SUPPORTED_BUS_RATES,
};

fn has_whitespace(text: &str) -> bool {
    text.chars().any(char::is_whitespace)
}

// ============================================================================
// Topology documents
// ============================================================================

/// One system topology file: named buses and the devices wired to them.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemDocument {
    pub name: String,
    #[serde(default)]
    pub can_buses: Vec<BusEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusEntry {
    pub name: String,
    /// Bit rate in bits per second.
    pub rate: u32,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub node_id: u8,
    /// Interface reference, e.g. `interfaces/motor_driver`. Only the segment
    /// after the last `/` selects the interface document.
    pub device_type: String,
}

impl SystemDocument {
    /// Check every range and naming rule the shape alone cannot express.
    pub fn validate(&self) -> Result<(), String> {
        for bus in &self.can_buses {
            if !SUPPORTED_BUS_RATES.contains(&bus.rate) {
                return Err(format!(
                    "unsupported rate {} for bus '{}': supported rates are {:?}",
                    bus.rate, bus.name, SUPPORTED_BUS_RATES
                ));
            }
            for device in &bus.devices {
                if device.name.is_empty() || has_whitespace(&device.name) {
                    return Err(format!(
                        "invalid device name '{}' on bus '{}': names must be non-empty and contain no whitespace",
                        device.name, bus.name
                    ));
                }
                if device.node_id < NODE_ID_MIN || device.node_id > NODE_ID_MAX {
                    return Err(format!(
                        "invalid node_id {} for device '{}': must be in {}..={}",
                        device.node_id, device.name, NODE_ID_MIN, NODE_ID_MAX
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Interface documents
// ============================================================================

/// One device interface file: the port tables a device type exposes.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceDocument {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub messages: Option<MessageSection>,
    #[serde(default)]
    pub services: Option<ServiceSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageSection {
    #[serde(default)]
    pub receive: Vec<PortEntry>,
    #[serde(default)]
    pub transmit: Vec<PortEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceSection {
    #[serde(default)]
    pub client: Vec<PortEntry>,
    #[serde(default)]
    pub server: Vec<PortEntry>,
}

/// One row of a port table, before port-ID resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct PortEntry {
    pub name: String,
    /// Wire type name, resolved against the codec registry at composition.
    pub port_type: String,
    #[serde(default)]
    pub port_id: Option<u16>,
}

impl InterfaceDocument {
    pub fn receive_entries(&self) -> &[PortEntry] {
        match &self.messages {
            Some(section) => &section.receive,
            None => &[],
        }
    }

    pub fn transmit_entries(&self) -> &[PortEntry] {
        match &self.messages {
            Some(section) => &section.transmit,
            None => &[],
        }
    }

    pub fn client_entries(&self) -> &[PortEntry] {
        match &self.services {
            Some(section) => &section.client,
            None => &[],
        }
    }

    pub fn server_entries(&self) -> &[PortEntry] {
        match &self.services {
            Some(section) => &section.server,
            None => &[],
        }
    }

    /// Check naming and range rules across all four port tables.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || has_whitespace(&self.name) {
            return Err(format!(
                "invalid interface name '{}': names must be non-empty and contain no whitespace",
                self.name
            ));
        }
        let tables = [
            ("receive", self.receive_entries()),
            ("transmit", self.transmit_entries()),
            ("client", self.client_entries()),
            ("server", self.server_entries()),
        ];
        for (table, entries) in tables {
            for entry in entries {
                if entry.name.is_empty() || has_whitespace(&entry.name) {
                    return Err(format!(
                        "invalid port name '{}' in {} table: names must be non-empty and contain no whitespace",
                        entry.name, table
                    ));
                }
                if entry.port_type.is_empty() || has_whitespace(&entry.port_type) {
                    return Err(format!(
                        "invalid type '{}' for port '{}': type names must be non-empty and contain no whitespace",
                        entry.port_type, entry.name
                    ));
                }
                if let Some(id) = entry.port_id {
                    if !(CUSTOM_PORT_ID_MIN..=CUSTOM_PORT_ID_MAX).contains(&id) {
                        return Err(format!(
                            "port_id {} for port '{}' out of range: must be in {}..={}",
                            id, entry.name, CUSTOM_PORT_ID_MIN, CUSTOM_PORT_ID_MAX
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
