// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Human-readable composition report.

use std::fmt::Write;

use crate::compose::error::ComposeResult;
use crate::model::PortDirection;

const RULE: &str =
    "================================================================================";

/// Render `result` as a multi-line diagnostic report.
///
/// Intended for startup logs and configuration debugging; the layout is for
/// humans and not part of the stable API.
#[must_use]
pub fn render_report(result: &ComposeResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "CANPORT SYSTEM COMPOSITION REPORT");
    let _ = writeln!(out, "{RULE}");
    if result.success() {
        let _ = writeln!(out, "Status: OK");
    } else {
        let _ = writeln!(out, "Status: FAILED ({} errors)", result.errors.len());
    }

    let model = &result.model;
    let _ = writeln!(out);
    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(out, "  System:      {}", if model.name.is_empty() { "(none)" } else { &model.name });
    let _ = writeln!(out, "  Buses:       {}", model.buses.len());
    let _ = writeln!(out, "  Devices:     {}", model.device_count());
    let _ = writeln!(out, "  Interfaces:  {}", model.interfaces.len());
    let _ = writeln!(out, "  Wire types:  {}", result.wire_types.len());
    let _ = writeln!(out, "  Errors:      {}", result.errors.len());

    if !model.buses.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "BUSES");
        for bus in &model.buses {
            let _ = writeln!(out, "  {} ({} bps)", bus.name, bus.rate);
            for device in &bus.devices {
                match &device.interface {
                    Some(interface) => {
                        let _ = writeln!(
                            out,
                            "    [ok] {} (node {}) {} -> {} v{}",
                            device.name,
                            device.node_id,
                            device.device_type,
                            interface.name,
                            interface.version
                        );
                        for (label, direction) in [
                            ("receive ", PortDirection::Receive),
                            ("transmit", PortDirection::Transmit),
                            ("client  ", PortDirection::Client),
                            ("server  ", PortDirection::Server),
                        ] {
                            let ports = ports_line(device, direction);
                            if !ports.is_empty() {
                                let _ = writeln!(out, "         {label} {ports}");
                            }
                        }
                    }
                    None => {
                        let _ = writeln!(
                            out,
                            "    [!!] {} (node {}) {} -> UNRESOLVED",
                            device.name, device.node_id, device.device_type
                        );
                    }
                }
            }
        }
    }

    if !result.wire_types.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "WIRE TYPES");
        for wire_type in &result.wire_types {
            let _ = writeln!(out, "  {wire_type}");
        }
    }

    if !result.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "ERRORS");
        for (index, error) in result.errors.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}: {}", index + 1, error.kind, error.message);
            if let Some(path) = &error.file_path {
                let _ = writeln!(out, "     file: {}", path.display());
            }
            for (key, value) in &error.details {
                let _ = writeln!(out, "     {key}: {value}");
            }
        }
    }

    let _ = writeln!(out, "{RULE}");
    out
}

fn ports_line(device: &crate::model::DeviceInfo, direction: PortDirection) -> String {
    let Some(interface) = &device.interface else {
        return String::new();
    };
    let mut names = device.port_names(direction);
    for name in &mut names {
        if let Some(port) = interface.port(direction, name) {
            let _ = write!(name, "({})", port.port_id);
        }
    }
    names.join(", ")
}
