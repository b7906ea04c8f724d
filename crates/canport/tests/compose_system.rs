// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end composition tests over real YAML trees on disk.

use std::path::Path;
use std::sync::Arc;

use canport::{
    compose, compose_from_env, render_report, CodecError, CodecRegistry, ComposeErrorKind,
    EnvPathsError, MessageCodec, PortDirection, Value,
};
use tempfile::TempDir;

struct U8Codec;

impl MessageCodec for U8Codec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        value
            .as_u64()
            .filter(|v| *v <= 255)
            .map(|v| vec![v as u8])
            .ok_or_else(|| CodecError::Encode("expected integer 0..=255".into()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        match bytes {
            [byte] => Ok(Value::from(u64::from(*byte))),
            _ => Err(CodecError::Decode(format!("expected 1 byte, got {}", bytes.len()))),
        }
    }
}

fn registry() -> CodecRegistry {
    let mut codecs = CodecRegistry::new();
    codecs.register("test/Byte", Arc::new(U8Codec));
    codecs
}

fn write_yaml(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("write YAML file");
}

fn motor_driver_interface(dir: &Path) {
    write_yaml(
        dir,
        "motor_driver.yaml",
        r"
name: motor_driver
version: '1.0'
messages:
  receive:
    - name: cmd
      port_type: test/Byte
  transmit:
    - name: status
      port_type: test/Byte
      port_id: 40
",
    );
}

fn rover_system(dir: &Path, file_name: &str) {
    write_yaml(
        dir,
        file_name,
        r"
name: rover
can_buses:
  - name: drive
    rate: 500000
    devices:
      - name: motor0
        node_id: 5
        device_type: interfaces/motor_driver
",
    );
}

#[test]
fn composes_a_single_system() {
    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    rover_system(systems.path(), "rover.yaml");
    motor_driver_interface(interfaces.path());

    let result = compose(
        &[systems.path().to_path_buf()],
        &[interfaces.path().to_path_buf()],
        &registry(),
    );

    assert!(result.success(), "unexpected errors: {:?}", result.errors);
    let model = &result.model;
    assert_eq!(model.name, "rover");
    assert_eq!(model.buses.len(), 1);
    assert_eq!(model.bus("drive").map(|b| b.rate), Some(500_000));
    assert_eq!(model.device_count(), 1);

    let motor = model.device("motor0").expect("device composed");
    assert_eq!(motor.node_id, 5);
    assert_eq!(motor.bus_name, "drive");
    assert_eq!(motor.source_system, "rover");
    assert!(Arc::ptr_eq(
        model.device_by_node("drive", 5).expect("node lookup"),
        motor
    ));

    let interface = model
        .interface_for_device("drive", "motor0")
        .expect("interface attached");
    assert_eq!(interface.name, "motor_driver");
    // Unspecified IDs fill from the bottom of the custom range
    assert_eq!(
        interface.port(PortDirection::Receive, "cmd").map(|p| p.port_id),
        Some(33)
    );
    // Explicit IDs are honored
    assert_eq!(
        interface.port(PortDirection::Transmit, "status").map(|p| p.port_id),
        Some(40)
    );

    assert!(result.wire_types.contains("test/Byte"));
    assert_eq!(result.wire_types.len(), 1);
}

#[test]
fn merges_buses_across_documents_first_rate_wins() {
    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    motor_driver_interface(interfaces.path());
    // Files load in sorted order within a directory
    rover_system(systems.path(), "01_rover.yaml");
    write_yaml(
        systems.path(),
        "02_arm.yaml",
        r"
name: arm
can_buses:
  - name: drive
    rate: 250000
    devices:
      - name: gripper
        node_id: 9
        device_type: interfaces/motor_driver
",
    );

    let result = compose(
        &[systems.path().to_path_buf()],
        &[interfaces.path().to_path_buf()],
        &registry(),
    );

    assert!(result.success(), "unexpected errors: {:?}", result.errors);
    let model = &result.model;
    // First document to mention a bus fixes its rate and its name
    assert_eq!(model.name, "rover");
    assert_eq!(model.buses.len(), 1);
    let drive = model.bus("drive").expect("merged bus");
    assert_eq!(drive.rate, 500_000);
    assert_eq!(drive.devices.len(), 2);
    assert_eq!(model.device("gripper").map(|d| d.source_system.as_str()), Some("arm"));
}

#[test]
fn duplicate_device_names_keep_the_first_and_report_a_conflict() {
    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    motor_driver_interface(interfaces.path());
    rover_system(systems.path(), "01_rover.yaml");
    write_yaml(
        systems.path(),
        "02_clone.yaml",
        r"
name: clone
can_buses:
  - name: aux
    rate: 250000
    devices:
      - name: motor0
        node_id: 7
        device_type: interfaces/motor_driver
",
    );

    let result = compose(
        &[systems.path().to_path_buf()],
        &[interfaces.path().to_path_buf()],
        &registry(),
    );

    assert!(!result.success());
    let conflicts = result.errors_of_kind(ComposeErrorKind::DeviceNameConflict);
    assert_eq!(conflicts.len(), 1);
    let conflict = conflicts[0];
    assert_eq!(conflict.detail("device"), Some("motor0"));
    assert_eq!(conflict.detail("existing_system"), Some("rover"));
    assert_eq!(conflict.detail("system"), Some("clone"));

    // The first declaration stands; the duplicate never lands on its bus
    let motor = result.model.device("motor0").expect("first wins");
    assert_eq!(motor.node_id, 5);
    assert_eq!(motor.bus_name, "drive");
    assert_eq!(result.model.bus("aux").map(|b| b.devices.len()), Some(0));
}

#[test]
fn unknown_device_type_is_reported_and_left_unresolved() {
    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    motor_driver_interface(interfaces.path());
    write_yaml(
        systems.path(),
        "rover.yaml",
        r"
name: rover
can_buses:
  - name: drive
    rate: 500000
    devices:
      - name: gps0
        node_id: 3
        device_type: interfaces/gps
",
    );

    let result = compose(
        &[systems.path().to_path_buf()],
        &[interfaces.path().to_path_buf()],
        &registry(),
    );

    assert!(!result.success());
    let missing = result.errors_of_kind(ComposeErrorKind::InterfaceNotFound);
    assert_eq!(missing.len(), 1);
    assert!(missing[0].message.contains("gps"));
    assert_eq!(missing[0].detail("device"), Some("gps0"));
    assert_eq!(missing[0].detail("bus"), Some("drive"));

    // The device still exists in the model, just without an interface
    let gps = result.model.device("gps0").expect("device kept");
    assert!(gps.interface.is_none());
    assert!(gps.port_names(PortDirection::Receive).is_empty());
}

#[test]
fn missing_codec_is_reported_per_device() {
    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    motor_driver_interface(interfaces.path());
    write_yaml(
        systems.path(),
        "rover.yaml",
        r"
name: rover
can_buses:
  - name: drive
    rate: 500000
    devices:
      - name: motor0
        node_id: 5
        device_type: interfaces/motor_driver
      - name: motor1
        node_id: 6
        device_type: interfaces/motor_driver
",
    );

    let result = compose(
        &[systems.path().to_path_buf()],
        &[interfaces.path().to_path_buf()],
        &CodecRegistry::new(),
    );

    assert!(!result.success());
    let missing = result.errors_of_kind(ComposeErrorKind::CodecNotFound);
    // The check runs per attachment, one error per device of the type
    assert_eq!(missing.len(), 2);
    assert!(missing.iter().all(|e| e.detail("wire_type") == Some("test/Byte")));

    // Interfaces still attach; only the codec is missing
    assert!(result.model.device("motor0").expect("kept").interface.is_some());
}

#[test]
fn document_errors_get_distinct_kinds() {
    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    write_yaml(systems.path(), "broken.yaml", "name: [unclosed\n");
    write_yaml(systems.path(), "shapeless.yaml", "can_buses: []\n");
    write_yaml(
        systems.path(),
        "badnode.yaml",
        r"
name: rover
can_buses:
  - name: drive
    rate: 500000
    devices:
      - name: motor0
        node_id: 200
        device_type: interfaces/motor_driver
",
    );
    write_yaml(
        interfaces.path(),
        "dup.yaml",
        r"
name: dup
version: '1.0'
messages:
  transmit:
    - name: a
      port_type: test/Byte
      port_id: 50
    - name: b
      port_type: test/Byte
      port_id: 50
",
    );

    let result = compose(
        &[systems.path().to_path_buf()],
        &[interfaces.path().to_path_buf()],
        &registry(),
    );

    assert!(!result.success());
    assert_eq!(result.errors_of_kind(ComposeErrorKind::DocumentParseError).len(), 1);
    // Missing required field and out-of-range node are both validation errors
    assert_eq!(result.errors_of_kind(ComposeErrorKind::SystemValidationError).len(), 2);
    let interface_errors = result.errors_of_kind(ComposeErrorKind::InterfaceValidationError);
    assert_eq!(interface_errors.len(), 1);
    assert!(interface_errors[0].message.contains("duplicate port_id 50"));
    // Each error points at the file it came from
    assert!(result.errors.iter().all(|e| e.file_path.is_some()));
}

#[test]
fn missing_search_directories_are_reported() {
    let result = compose(
        &[Path::new("/definitely/not/here/systems").to_path_buf()],
        &[Path::new("/definitely/not/here/interfaces").to_path_buf()],
        &registry(),
    );
    assert!(!result.success());
    assert_eq!(result.errors_of_kind(ComposeErrorKind::SearchDirNotFound).len(), 2);
    assert!(result.model.is_empty());
}

#[test]
fn later_interface_directories_override_earlier_ones() {
    let systems = TempDir::new().expect("temp dir");
    let base = TempDir::new().expect("temp dir");
    let overlay = TempDir::new().expect("temp dir");
    rover_system(systems.path(), "rover.yaml");
    motor_driver_interface(base.path());
    write_yaml(
        overlay.path(),
        "motor_driver.yaml",
        r"
name: motor_driver
version: '2.0'
messages:
  receive:
    - name: cmd
      port_type: test/Byte
",
    );

    let result = compose(
        &[systems.path().to_path_buf()],
        &[base.path().to_path_buf(), overlay.path().to_path_buf()],
        &registry(),
    );

    assert!(result.success(), "unexpected errors: {:?}", result.errors);
    let interface = result
        .model
        .interface_for_device("drive", "motor0")
        .expect("attached");
    assert_eq!(interface.version, "2.0");
    assert!(interface.port(PortDirection::Transmit, "status").is_none());
}

#[test]
fn report_renders_the_composed_tree() {
    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    rover_system(systems.path(), "rover.yaml");
    motor_driver_interface(interfaces.path());

    let result = compose(
        &[systems.path().to_path_buf()],
        &[interfaces.path().to_path_buf()],
        &registry(),
    );
    let report = render_report(&result);

    assert!(report.contains("CANPORT SYSTEM COMPOSITION REPORT"));
    assert!(report.contains("Status: OK"));
    assert!(report.contains("drive (500000 bps)"));
    assert!(report.contains("[ok] motor0 (node 5) interfaces/motor_driver -> motor_driver v1.0"));
    assert!(report.contains("cmd(33)"));
    assert!(report.contains("status(40)"));
    assert!(report.contains("test/Byte"));
}

#[test]
fn report_lists_failures() {
    let result = compose(
        &[Path::new("/definitely/not/here").to_path_buf()],
        &[],
        &registry(),
    );
    let report = render_report(&result);
    assert!(report.contains("Status: FAILED (1 errors)"));
    assert!(report.contains("SEARCH_DIR_NOT_FOUND"));
}

#[test]
fn compose_from_env_reads_search_paths() {
    // Env handling lives in one test; parallel tests must not share these
    // variables
    std::env::remove_var("CANPORT_SYSTEM_PATHS");
    std::env::remove_var("CANPORT_INTERFACE_PATHS");
    assert_eq!(
        compose_from_env(&registry()).unwrap_err(),
        EnvPathsError::Missing("CANPORT_SYSTEM_PATHS")
    );

    let systems = TempDir::new().expect("temp dir");
    let interfaces = TempDir::new().expect("temp dir");
    rover_system(systems.path(), "rover.yaml");
    motor_driver_interface(interfaces.path());

    std::env::set_var("CANPORT_SYSTEM_PATHS", systems.path());
    assert_eq!(
        compose_from_env(&registry()).unwrap_err(),
        EnvPathsError::Missing("CANPORT_INTERFACE_PATHS")
    );

    std::env::set_var("CANPORT_INTERFACE_PATHS", interfaces.path());
    let result = compose_from_env(&registry()).expect("paths resolve");
    assert!(result.success(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.model.device_count(), 1);

    std::env::remove_var("CANPORT_SYSTEM_PATHS");
    std::env::remove_var("CANPORT_INTERFACE_PATHS");
}
