//! End-to-end tests for help, version and argument errors.

mod fixtures;
use fixtures::*;

#[test]
fn test_help_exits_0() {
    let ws = Workspace::new();
    let output = ws.run(&["--help"]);
    assert_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("batch-to-json"));
    assert!(stdout.contains("recolor"));
}

#[test]
fn test_version_json() {
    let ws = Workspace::new();
    let output = ws.run(&["version"]);
    assert_code(&output, 0);
    let result = stdout_json(&output);
    assert_eq!(result["success"], true);
    assert_eq!(result["tool"], "rvfxe");
    assert_eq!(result["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_command_exits_1() {
    let ws = Workspace::new();
    assert_code(&ws.run(&["frobnicate"]), 1);
}

#[test]
fn test_missing_arguments_exit_1() {
    let ws = Workspace::new();
    assert_code(&ws.run(&["batch-to-json"]), 1);
    assert_code(&ws.run(&["scan"]), 1);
}
