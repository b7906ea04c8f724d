// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composition engine.
//!
//! Turns topology and interface YAML files into one [`SystemModel`]:
//!
//! 1. Scan the interface search directories and load every interface
//!    document, resolving port IDs per direction.
//! 2. Scan the system search directories and load every topology document.
//! 3. Merge all topologies into a single model, attaching interfaces to
//!    devices by type key and checking that every referenced wire type has
//!    a registered codec.
//!
//! Problems never abort the run. Each one is recorded on the result and
//! composition keeps going, so a single pass reports everything wrong with
//! a configuration tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::codec::CodecRegistry;
use crate::compose::error::{ComposeError, ComposeErrorKind, ComposeResult, EnvPathsError};
use crate::config::{ENV_INTERFACE_PATHS, ENV_SYSTEM_PATHS};
use crate::model::document::{InterfaceDocument, SystemDocument};
use crate::model::resolved::{CanBusInfo, DeviceInfo, InterfaceInfo};

// ============================================================================
// Document discovery
// ============================================================================

fn has_yaml_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// Collect YAML documents from `dirs`, sorted within each directory so runs
/// are deterministic. Missing directories are recorded and skipped.
fn enumerate_documents(dirs: &[PathBuf], role: &str, errors: &mut Vec<ComposeError>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            errors.push(
                ComposeError::new(
                    ComposeErrorKind::SearchDirNotFound,
                    format!("{role} search directory not found: {}", dir.display()),
                )
                .with_detail("search_dir", dir.display().to_string()),
            );
            continue;
        }
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                errors.push(
                    ComposeError::new(
                        ComposeErrorKind::FileReadError,
                        format!("Failed to list directory: {e}"),
                    )
                    .with_path(dir),
                );
                continue;
            }
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_yaml_extension(path))
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

// ============================================================================
// Document loading
// ============================================================================

/// Load one YAML document in two stages so syntax and shape problems get
/// distinct error kinds: `from_str` to a raw value first (syntax), then
/// `from_value` into the target shape.
fn load_document<T: DeserializeOwned>(
    path: &Path,
    validation_kind: ComposeErrorKind,
    role: &str,
) -> Result<T, ComposeError> {
    if !path.exists() {
        return Err(ComposeError::new(ComposeErrorKind::FileNotFound, "File not found").with_path(path));
    }
    let text = fs::read_to_string(path).map_err(|e| {
        ComposeError::new(
            ComposeErrorKind::FileReadError,
            format!("Failed to read file: {e}"),
        )
        .with_path(path)
    })?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|e| {
        ComposeError::new(
            ComposeErrorKind::DocumentParseError,
            format!("Failed to parse YAML file: {e}"),
        )
        .with_path(path)
    })?;
    serde_yaml::from_value(value).map_err(|e| {
        ComposeError::new(
            validation_kind,
            format!("{role} document validation failed: {e}"),
        )
        .with_path(path)
    })
}

// ============================================================================
// Composition
// ============================================================================

/// Compose a system model from topology and interface search directories.
///
/// `codecs` is consulted for every wire type referenced by an attached
/// interface; missing codecs are reported as
/// [`ComposeErrorKind::CodecNotFound`] without stopping composition.
#[must_use]
pub fn compose(
    system_dirs: &[PathBuf],
    interface_dirs: &[PathBuf],
    codecs: &CodecRegistry,
) -> ComposeResult {
    let mut result = ComposeResult::default();

    // Interfaces first, so topology devices can attach in the same pass.
    let interface_files = enumerate_documents(interface_dirs, "Interface", &mut result.errors);
    let mut interfaces: HashMap<String, Arc<InterfaceInfo>> = HashMap::new();
    for path in &interface_files {
        let doc: InterfaceDocument =
            match load_document(path, ComposeErrorKind::InterfaceValidationError, "Interface") {
                Ok(doc) => doc,
                Err(e) => {
                    result.errors.push(e);
                    continue;
                }
            };
        if let Err(msg) = doc.validate() {
            result.errors.push(
                ComposeError::new(
                    ComposeErrorKind::InterfaceValidationError,
                    format!("Interface document validation failed: {msg}"),
                )
                .with_path(path),
            );
            continue;
        }
        let type_key = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("")
            .to_string();
        let info = match InterfaceInfo::from_document(&doc, path, &type_key) {
            Ok(info) => info,
            Err(msg) => {
                result.errors.push(
                    ComposeError::new(
                        ComposeErrorKind::InterfaceValidationError,
                        format!("Interface document validation failed: {msg}"),
                    )
                    .with_path(path),
                );
                continue;
            }
        };
        log::debug!(
            "[COMPOSE] loaded interface '{}' v{} from {}",
            info.name,
            info.version,
            path.display()
        );
        result.wire_types.extend(info.wire_types.iter().cloned());
        // Later directories override earlier ones for the same type key
        interfaces.insert(type_key, Arc::new(info));
    }

    let system_files = enumerate_documents(system_dirs, "System", &mut result.errors);
    for path in &system_files {
        let doc: SystemDocument =
            match load_document(path, ComposeErrorKind::SystemValidationError, "System") {
                Ok(doc) => doc,
                Err(e) => {
                    result.errors.push(e);
                    continue;
                }
            };
        if let Err(msg) = doc.validate() {
            result.errors.push(
                ComposeError::new(
                    ComposeErrorKind::SystemValidationError,
                    format!("System document validation failed: {msg}"),
                )
                .with_path(path),
            );
            continue;
        }
        log::debug!("[COMPOSE] composing system '{}' from {}", doc.name, path.display());
        if result.model.name.is_empty() {
            result.model.name = doc.name.clone();
        }

        for bus_entry in &doc.can_buses {
            // Buses with the same name across documents merge into one; the
            // first declaration fixes the rate.
            let bus_index = match result
                .model
                .buses
                .iter()
                .position(|bus| bus.name == bus_entry.name)
            {
                Some(index) => index,
                None => {
                    result.model.buses.push(CanBusInfo {
                        name: bus_entry.name.clone(),
                        rate: bus_entry.rate,
                        devices: Vec::new(),
                    });
                    result.model.buses.len() - 1
                }
            };

            for device_entry in &bus_entry.devices {
                if let Some(existing) = result.model.devices.get(&device_entry.name) {
                    result.errors.push(
                        ComposeError::new(
                            ComposeErrorKind::DeviceNameConflict,
                            format!(
                                "Device name '{}' already declared in system '{}'",
                                device_entry.name, existing.source_system
                            ),
                        )
                        .with_path(path)
                        .with_detail("device", device_entry.name.as_str())
                        .with_detail("existing_system", existing.source_system.as_str())
                        .with_detail("existing_bus", existing.bus_name.as_str())
                        .with_detail("system", doc.name.as_str())
                        .with_detail("bus", bus_entry.name.as_str()),
                    );
                    continue;
                }

                // Only the segment after the last '/' selects the interface
                let type_key = device_entry
                    .device_type
                    .rsplit('/')
                    .next()
                    .unwrap_or(device_entry.device_type.as_str());
                let interface = interfaces.get(type_key).cloned();
                match &interface {
                    Some(info) => {
                        result
                            .model
                            .interfaces
                            .entry(type_key.to_string())
                            .or_insert_with(|| Arc::clone(info));
                        for wire_type in &info.wire_types {
                            if !codecs.resolve(wire_type) {
                                result.errors.push(
                                    ComposeError::new(
                                        ComposeErrorKind::CodecNotFound,
                                        format!("No codec registered for wire type: {wire_type}"),
                                    )
                                    .with_detail("wire_type", wire_type.as_str())
                                    .with_detail("device", device_entry.name.as_str())
                                    .with_detail("interface", info.name.as_str()),
                                );
                            }
                        }
                    }
                    None => {
                        result.errors.push(
                            ComposeError::new(
                                ComposeErrorKind::InterfaceNotFound,
                                format!("Interface not found for device type: {type_key}"),
                            )
                            .with_detail("device", device_entry.name.as_str())
                            .with_detail("device_type", device_entry.device_type.as_str())
                            .with_detail("system", doc.name.as_str())
                            .with_detail("bus", bus_entry.name.as_str()),
                        );
                    }
                }

                let device = Arc::new(DeviceInfo {
                    name: device_entry.name.clone(),
                    node_id: device_entry.node_id,
                    source_system: doc.name.clone(),
                    device_type: device_entry.device_type.clone(),
                    bus_name: bus_entry.name.clone(),
                    interface,
                });
                result.model.buses[bus_index].devices.push(Arc::clone(&device));
                result.model.devices.insert(device.name.clone(), device);
            }
        }
    }

    log::debug!(
        "[COMPOSE] composed {} device(s) on {} bus(es), {} error(s)",
        result.model.device_count(),
        result.model.buses.len(),
        result.errors.len()
    );
    result
}

// ============================================================================
// Environment entry point
// ============================================================================

fn split_env_paths(var: &'static str) -> Result<Vec<PathBuf>, EnvPathsError> {
    let raw = std::env::var(var).map_err(|_| EnvPathsError::Missing(var))?;
    let dirs: Vec<PathBuf> = std::env::split_paths(&raw)
        .filter(|path| !path.as_os_str().is_empty())
        .collect();
    if dirs.is_empty() {
        return Err(EnvPathsError::Empty(var));
    }
    Ok(dirs)
}

/// [`compose`] with search directories taken from the
/// `CANPORT_SYSTEM_PATHS` and `CANPORT_INTERFACE_PATHS` environment
/// variables (platform path-separator lists).
pub fn compose_from_env(codecs: &CodecRegistry) -> Result<ComposeResult, EnvPathsError> {
    let system_dirs = split_env_paths(ENV_SYSTEM_PATHS)?;
    let interface_dirs = split_env_paths(ENV_INTERFACE_PATHS)?;
    Ok(compose(&system_dirs, &interface_dirs, codecs))
}
