//! Registry file loading tests

use simrun_build::{BuildError, TargetRegistry};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "simulation/targets.json",
        r#"{
  "default_target": "pid",
  "build_targets": [
    {
      "id": "pid",
      "description": "PID controller testbench",
      "sources": ["pid_testbench.v"],
      "include_targets": ["pid_core"],
      "working_dir": "simulation",
      "trace_file": "pid_testbench.vcd"
    },
    { "id": "pid_core", "sources": ["pid.v", "fixed_point.v"] }
  ]
}"#,
    );

    let registry = TargetRegistry::load(&path).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.default_target_id(), "pid");

    let pid = registry.get("pid").unwrap();
    assert_eq!(pid.description.as_deref(), Some("PID controller testbench"));
    assert_eq!(pid.outputs_dir, "outputs");
    assert_eq!(pid.trace_file.as_deref(), Some("pid_testbench.vcd"));
}

#[test]
fn test_load_toml_file_by_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "targets.toml",
        r#"
default_target = "alu"

[[build_targets]]
id = "alu"
sources = ["alu.v", "alu_tb.v"]
working_dir = "rtl"
outputs_dir = "build"
"#,
    );

    let registry = TargetRegistry::load(&path).unwrap();
    assert_eq!(registry.get("alu").unwrap().outputs_dir, "build");
}

#[test]
fn test_load_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = TargetRegistry::load(&temp_dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, BuildError::IoError { .. }));
}

#[test]
fn test_load_invalid_json_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "targets.json", "{ not json");

    let err = TargetRegistry::load(&path).unwrap_err();
    match err {
        BuildError::MalformedRegistry { source_name, .. } => {
            assert!(source_name.ends_with("targets.json"));
        }
        other => panic!("Expected MalformedRegistry, got {:?}", other),
    }
}

#[test]
fn test_build_targets_must_be_a_list() {
    let err = TargetRegistry::from_json_str(
        r#"{"default_target": "t1", "build_targets": {"id": "t1"}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::MalformedRegistry { .. }));
}

#[test]
fn test_unknown_top_level_field_rejected() {
    let err = TargetRegistry::from_json_str(
        r#"{"default_target": "t1", "build_targets": [], "targets": []}"#,
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::MalformedRegistry { .. }));
}

#[test]
fn test_empty_id_rejected() {
    let err = TargetRegistry::from_json_str(
        r#"{"default_target": "t1", "build_targets": [{"id": ""}]}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Target id cannot be empty"));
}

#[test]
fn test_path_like_id_rejected() {
    let err = TargetRegistry::from_json_str(
        r#"{"default_target": "sub/top", "build_targets": [{"id": "sub/top", "working_dir": "sim"}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::MalformedRegistry { .. }));
    assert!(err.to_string().contains("sub/top"));
}

#[test]
fn test_empty_registry_is_valid() {
    let registry =
        TargetRegistry::from_json_str(r#"{"default_target": "t1", "build_targets": []}"#)
            .unwrap();
    assert!(registry.is_empty());
}
