//! End-to-end tests for `rvfxe config`.

mod fixtures;
use fixtures::*;
use std::fs;

#[test]
fn test_config_show_default() {
    let ws = Workspace::new();
    let output = ws.run(&["config", "show"]);
    assert_code(&output, 0);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RVFXE Configuration"));
    assert!(stdout.contains("Converter Tool: (not configured)"));
}

#[test]
fn test_config_show_json_format() {
    let ws = Workspace::new();
    let output = ws.run(&["config", "show", "--json"]);
    assert_code(&output, 0);

    let result: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("Should parse JSON");
    assert!(result["paths"].is_object());
    assert_eq!(result["conversion"]["use_cache"], true);
    assert_eq!(result["editing"]["history_limit"], 0);
    assert!(result["filter"]["include_keywords"]
        .as_array()
        .unwrap()
        .iter()
        .any(|k| k == "color"));
}

#[test]
fn test_config_set_filter_persists() {
    let ws = Workspace::new();
    let output = ws.run(&[
        "config",
        "set",
        "--include",
        "glow, rim",
        "--exclude",
        "mask",
        "--workers",
        "3",
    ]);
    assert_code(&output, 0);
    assert!(ws.config().join("config.toml").exists());

    let output = ws.run(&["config", "show", "--json"]);
    let result: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(result["filter"]["include_keywords"], serde_json::json!(["glow", "rim"]));
    assert_eq!(result["filter"]["exclude_keywords"], serde_json::json!(["mask"]));
    assert_eq!(result["conversion"]["workers"], 3);
}

#[test]
fn test_config_filter_changes_scan() {
    let ws = Workspace::new();
    write_doc(
        &ws.docs(),
        "mi.json",
        &material_doc(vec![
            vector_param("BaseColor", 0.8, 0.2, 0.2),
            vector_param("GlowAmount", 0.1, 0.2, 0.3),
        ]),
    );

    let output = ws.run(&["scan", ws.docs().to_str().unwrap(), "--json"]);
    assert_eq!(stdout_json(&output)["count"], 1);

    assert_code(&ws.run(&["config", "set", "--include", "glow"]), 0);
    let output = ws.run(&["scan", ws.docs().to_str().unwrap(), "--json"]);
    let result = stdout_json(&output);
    assert_eq!(result["count"], 1);
    assert_eq!(result["parameters"][0]["paramName"], "GlowAmount");
}

#[test]
fn test_config_set_requires_option() {
    let ws = Workspace::new();
    let output = ws.run(&["config", "set"]);
    assert_code(&output, 1);
}

#[test]
fn test_config_set_rejects_missing_tool() {
    let ws = Workspace::new();
    let output = ws.run(&[
        "config",
        "set",
        "--tool",
        ws.path().join("nope").to_str().unwrap(),
    ]);
    assert_code(&output, 1);
    assert!(!ws.config().join("config.toml").exists());
}

#[test]
fn test_corrupt_config_is_usage_error() {
    let ws = Workspace::new();
    fs::write(ws.config().join("config.toml"), "[paths\nbroken").unwrap();
    let output = ws.run(&["config", "show"]);
    assert_code(&output, 1);
}
