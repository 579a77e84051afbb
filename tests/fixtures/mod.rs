//! Shared test fixtures for E2E CLI tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the rvfxe binary (set by cargo at compile time)
pub fn rvfxe_bin() -> &'static str {
    env!("CARGO_BIN_EXE_rvfxe")
}

/// Creates a Command with an isolated config directory.
pub fn isolated_command(args: &[&str], config_dir: &Path) -> Command {
    let mut cmd = Command::new(rvfxe_bin());
    cmd.env("RVFXE_CONFIG_DIR", config_dir);
    cmd.env_remove("RUST_LOG");
    cmd.args(args);
    cmd
}

/// Runs the command and returns its output.
pub fn run(args: &[&str], config_dir: &Path) -> Output {
    isolated_command(args, config_dir)
        .output()
        .expect("Failed to execute command")
}

/// Parses the last non-empty stdout line as JSON.
pub fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_else(|| panic!("no stdout; stderr: {}", String::from_utf8_lossy(&output.stderr)));
    serde_json::from_str(line).expect("stdout should be JSON")
}

/// Parses every stderr line that is a JSON progress event.
pub fn progress_events(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(|v| v["type"] == "progress")
        .collect()
}

/// One `VectorParameterValues` entry.
pub fn vector_param(name: &str, r: f64, g: f64, b: f64) -> Value {
    json!({
        "$type": "UAssetAPI.PropertyTypes.Structs.StructPropertyData, UAssetAPI",
        "StructType": "VectorParameterValue",
        "Name": "VectorParameterValues",
        "Value": [
            {
                "Name": "ParameterInfo",
                "Value": [
                    {"Name": "Name", "Value": name},
                    {"Name": "Association", "Value": "GlobalParameter"}
                ]
            },
            {
                "Name": "ParameterValue",
                "StructType": "LinearColor",
                "Value": [{"Name": "ParameterValue", "Value": {"R": r, "G": g, "B": b, "A": 1.0}}]
            }
        ]
    })
}

/// A material instance document holding `params`.
pub fn material_doc(params: Vec<Value>) -> Value {
    json!({
        "Info": "Serialized with UAssetAPI",
        "Exports": [{
            "ObjectName": "MI_Fx",
            "Data": [
                {"Name": "ScalarParameterValues", "Value": []},
                {"Name": "VectorParameterValues", "Value": params}
            ]
        }]
    })
}

/// The single-BaseColor material used across tests.
pub fn base_color_doc() -> Value {
    material_doc(vec![vector_param("BaseColor", 0.8, 0.2, 0.2)])
}

/// Writes `doc` as pretty JSON under `root/relative`.
pub fn write_doc(root: &Path, relative: &str, doc: &Value) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
    path
}

/// Reads a JSON file.
pub fn read_doc(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Workspace with `docs/`, `out/` and an isolated `config/` directory.
pub struct Workspace {
    pub temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("docs")).unwrap();
        fs::create_dir_all(temp_dir.path().join("config")).unwrap();
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn docs(&self) -> PathBuf {
        self.path().join("docs")
    }

    pub fn out(&self) -> PathBuf {
        self.path().join("out")
    }

    pub fn config(&self) -> PathBuf {
        self.path().join("config")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        run(args, &self.config())
    }
}

/// Asserts an exit code, showing both streams on failure.
pub fn assert_code(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Channel comparison with tolerance.
pub fn approx(actual: &Value, expected: f64) -> bool {
    actual.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}
