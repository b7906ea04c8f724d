// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolved ports and port-ID assignment.

use std::collections::BTreeSet;

use crate::config::{CUSTOM_PORT_ID_MAX, CUSTOM_PORT_ID_MIN};
use crate::model::document::PortEntry;

/// A named port with its wire type and resolved identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    /// Wire type name the payload codec is registered under.
    pub wire_type: String,
    pub port_id: u16,
}

/// The four port tables an interface may declare.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Messages the device accepts.
    Receive,
    /// Messages the device emits.
    Transmit,
    /// Service calls the device issues.
    Client,
    /// Service calls the device answers.
    Server,
}

impl PortDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PortDirection::Receive => "receive",
            PortDirection::Transmit => "transmit",
            PortDirection::Client => "client",
            PortDirection::Server => "server",
        }
    }
}

/// Resolve port IDs for one direction's entries.
///
/// Entries with an explicit `port_id` keep it; the rest are assigned, in
/// declaration order, the lowest identifiers from the custom range
/// (`33..=511`) not claimed by any explicit entry in the same list. Explicit
/// duplicates within the list are rejected.
pub fn assign_port_ids(entries: &[PortEntry]) -> Result<Vec<Port>, String> {
    let mut claimed = BTreeSet::new();
    for entry in entries {
        if let Some(id) = entry.port_id {
            if !claimed.insert(id) {
                return Err(format!(
                    "duplicate port_id {} (port '{}'): manually specified port_ids must be unique",
                    id, entry.name
                ));
            }
        }
    }

    let mut free = (CUSTOM_PORT_ID_MIN..=CUSTOM_PORT_ID_MAX).filter(|id| !claimed.contains(id));

    entries
        .iter()
        .map(|entry| {
            let port_id = match entry.port_id {
                Some(id) => id,
                None => free.next().ok_or_else(|| {
                    format!(
                        "no free port_id left for port '{}': custom range {}..={} exhausted",
                        entry.name, CUSTOM_PORT_ID_MIN, CUSTOM_PORT_ID_MAX
                    )
                })?,
            };
            Ok(Port {
                name: entry.name.clone(),
                wire_type: entry.port_type.clone(),
                port_id,
            })
        })
        .collect()
}
