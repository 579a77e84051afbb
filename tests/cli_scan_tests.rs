//! End-to-end tests for `rvfxe scan`.

mod fixtures;
use fixtures::*;
use serde_json::json;

#[test]
fn test_scan_lists_material_parameter() {
    let ws = Workspace::new();
    write_doc(&ws.docs(), "1011/fx/MI_Fire.json", &base_color_doc());

    let output = ws.run(&["scan", ws.docs().to_str().unwrap(), "--json"]);
    assert_code(&output, 0);

    let result = stdout_json(&output);
    assert_eq!(result["success"], true);
    assert_eq!(result["files"], 1);
    assert_eq!(result["count"], 1);
    let param = &result["parameters"][0];
    assert_eq!(param["paramName"], "BaseColor");
    assert_eq!(param["relativePath"], "1011/fx/MI_Fire.json");
    assert_eq!(param["folder"], "1011/fx");
    assert_eq!(param["hex"], "#cc3333");
    assert_eq!(result["folders"], json!(["1011/fx"]));
}

#[test]
fn test_scan_filters_and_reports_bad_files() {
    let ws = Workspace::new();
    write_doc(
        &ws.docs(),
        "a.json",
        &material_doc(vec![
            vector_param("BaseColor", 0.8, 0.2, 0.2),
            vector_param("RimTint", 0.5, 0.5, 0.5),
            vector_param("UVOffsetColor", 1.0, 0.0, 0.0),
        ]),
    );
    std::fs::write(ws.docs().join("broken.json"), "{ not json").unwrap();

    let output = ws.run(&["scan", ws.docs().to_str().unwrap(), "--json"]);
    assert_code(&output, 0);
    let result = stdout_json(&output);
    // UVOffsetColor is rejected by the exclude keywords
    assert_eq!(result["count"], 2);
    assert_eq!(result["failures"].as_array().unwrap().len(), 1);
    assert_eq!(result["failures"][0]["file"], "broken.json");

    let output = ws.run(&[
        "scan",
        ws.docs().to_str().unwrap(),
        "--json",
        "--hide-grayscale",
    ]);
    assert_eq!(stdout_json(&output)["count"], 1);

    let output = ws.run(&[
        "scan",
        ws.docs().to_str().unwrap(),
        "--json",
        "--search",
        "rim",
    ]);
    let result = stdout_json(&output);
    assert_eq!(result["count"], 1);
    assert_eq!(result["parameters"][0]["paramName"], "RimTint");
}

#[test]
fn test_scan_human_readable() {
    let ws = Workspace::new();
    write_doc(&ws.docs(), "mi.json", &base_color_doc());

    let output = ws.run(&["scan", ws.docs().to_str().unwrap()]);
    assert_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 color parameter(s)"));
    assert!(stdout.contains("BaseColor"));
}

#[test]
fn test_scan_missing_directory() {
    let ws = Workspace::new();
    let missing = ws.path().join("nope");

    let output = ws.run(&["scan", missing.to_str().unwrap()]);
    assert_code(&output, 2);
    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert!(result["error"].as_str().unwrap().contains("Directory not found"));
}
