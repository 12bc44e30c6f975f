// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! End-to-end tests for the nodeflow binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

fn nodeflow() -> Command {
    let mut cmd = Command::cargo_bin("nodeflow").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("NODEFLOW_REGISTRY");
    cmd
}

fn write(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn two_node() -> Value {
    json!({
        "1": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "m.safetensors"}},
        "2": {"class_type": "KSampler", "inputs": {"model": ["1", 0], "seed": 42}}
    })
}

#[test]
fn validate_accepts_two_node_workflow() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "workflow.json", &two_node());

    nodeflow()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Parsed 2 nodes (api form)"))
        .stdout(predicate::str::contains("Workflow is valid!"));
}

#[test]
fn validate_rejects_cycles() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "cycle.json",
        &json!({
            "1": {"class_type": "A", "inputs": {"x": ["2", 0]}},
            "2": {"class_type": "B", "inputs": {"x": ["1", 0]}}
        }),
    );

    nodeflow()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency"));
}

#[test]
fn validate_reports_missing_file() {
    nodeflow()
        .args(["validate", "/nonexistent/workflow.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn validate_reports_invalid_node() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "bad.json", &json!({"12": {"inputs": {}}}));

    nodeflow()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("'12'"));
}

#[test]
fn graph_text_lists_execution_order() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "workflow.json", &two_node());

    nodeflow()
        .args(["graph", "--format", "text"])
        .arg(&path)
        .assert()
        .success()
        .stdout("1. 1 (CheckpointLoaderSimple)\n2. 2 (KSampler) [depends: 1]\n");
}

#[test]
fn deps_json_lists_checkpoint() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "workflow.json", &two_node());

    let output = nodeflow()
        .args(["deps", "--format", "json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let deps: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(deps["models"]["checkpoints"], json!(["m.safetensors"]));
    assert_eq!(deps["custom_nodes"], json!([]));
}

#[test]
fn deps_scans_python_sources() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "workflow.json", &two_node());
    let source = temp.path().join("nodes.py");
    std::fs::write(&source, "import cv2\nfrom PIL import Image\n").unwrap();

    nodeflow()
        .args(["deps", "--source"])
        .arg(&source)
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("opencv-python"))
        .stdout(predicate::str::contains("pillow"));
}

#[test]
fn convert_empty_documents() {
    let temp = TempDir::new().unwrap();

    let ui = write(&temp, "ui.json", &json!({"nodes": [], "links": []}));
    let output = nodeflow().arg("convert").arg(&ui).output().unwrap();
    assert!(output.status.success());
    let api: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(api, json!({}));

    let api = write(&temp, "api.json", &json!({}));
    let output = nodeflow().arg("convert").arg(&api).output().unwrap();
    assert!(output.status.success());
    let ui: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ui, json!({"nodes": [], "links": []}));
}

#[test]
fn convert_ui_to_api_file() {
    let temp = TempDir::new().unwrap();
    let ui = write(
        &temp,
        "ui.json",
        &json!({
            "nodes": [
                {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["m.safetensors"]},
                {"id": 2, "type": "KSampler", "inputs": [{"name": "model", "link": 1}],
                 "widgets_values": [42, "randomize", 20, 8, "euler", "normal", 1]}
            ],
            "links": [[1, 1, 0, 2, 0, "MODEL"]]
        }),
    );
    let out = temp.path().join("api.json");

    nodeflow()
        .arg("convert")
        .arg(&ui)
        .args(["--to", "api", "-o"])
        .arg(&out)
        .assert()
        .success();

    let api: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(api["2"]["inputs"]["model"], json!(["1", 0]));
    assert_eq!(api["2"]["inputs"]["seed"], json!(42));
    assert!(api["2"]["inputs"].get("control_after_generate").is_none());
}

#[test]
fn preprocess_removes_reroute() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "workflow.json",
        &json!({
            "1": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "m.safetensors"}},
            "2": {"class_type": "Reroute", "inputs": {"input": ["1", 0]}},
            "3": {"class_type": "KSampler", "inputs": {"model": ["2", 0]}},
            "4": {"class_type": "SaveImage", "inputs": {"images": ["999", 0]}}
        }),
    );

    let output = nodeflow().arg("preprocess").arg(&path).output().unwrap();
    assert!(output.status.success());

    let cleaned: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(cleaned.get("2").is_none());
    assert_eq!(cleaned["3"]["inputs"]["model"], json!(["1", 0]));
    assert_eq!(cleaned["4"]["inputs"], json!({}));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("1 of 4 nodes removed"));
    assert!(stderr.contains("999"));
}

#[test]
fn analyze_json_over_glob() {
    let temp = TempDir::new().unwrap();
    write(&temp, "a.json", &two_node());
    write(&temp, "b.json", &two_node());

    let pattern = temp.path().join("*.json").display().to_string();
    let output = nodeflow()
        .args(["analyze", "--format", "json", pattern.as_str()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["execution_order"], json!(["1", "2"]));
    assert_eq!(reports[0]["complexity_level"], json!("simple"));
}

#[test]
fn registry_overlay_marks_custom_node_builtin() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "workflow.json",
        &json!({"1": {"class_type": "StudioSaver", "inputs": {}}}),
    );
    let overlay = temp.path().join("registry.yaml");
    std::fs::write(&overlay, "builtins: [StudioSaver]\n").unwrap();

    nodeflow()
        .arg("--registry")
        .arg(&overlay)
        .args(["deps", "--format", "json"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"custom_nodes\": []"));
}

#[test]
fn verbose_graph_reports_removed_nodes_on_stderr() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "workflow.json",
        &json!({
            "1": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "m.safetensors"}},
            "2": {"class_type": "Reroute", "inputs": {"input": ["1", 0]}},
            "3": {"class_type": "KSampler", "inputs": {"model": ["2", 0]}}
        }),
    );

    nodeflow()
        .args(["-v", "graph", "--format", "text"])
        .arg(&path)
        .assert()
        .success()
        .stdout("1. 1 (CheckpointLoaderSimple)\n2. 3 (KSampler) [depends: 1]\n")
        .stderr(predicate::str::contains("Removed: 2"));
}

#[test]
fn convert_reports_dropped_links() {
    let temp = TempDir::new().unwrap();
    let ui = write(
        &temp,
        "ui.json",
        &json!({
            "nodes": [
                {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["m.safetensors"]},
                {"id": 2, "type": "StudioMixer"}
            ],
            "links": [[4, 1, 0, 2, 3, "MODEL"]]
        }),
    );

    let output = nodeflow()
        .args(["-v", "convert", "--to", "api"])
        .arg(&ui)
        .output()
        .unwrap();
    assert!(output.status.success());

    let api: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(api["2"]["inputs"], json!({}));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("link 4"));
    assert!(stderr.contains("1 links dropped"));
}

#[test]
fn validate_rejects_duplicate_ui_ids() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "ui.json",
        &json!({
            "nodes": [
                {"id": 1, "type": "CheckpointLoaderSimple"},
                {"id": 1, "type": "SaveImage"}
            ],
            "links": []
        }),
    );

    nodeflow()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate node id"));
}
