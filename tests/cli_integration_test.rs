//! End-to-end runs of the imageset binary for commands that need no external tools

use serde_json::Value;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn imageset(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_imageset"))
        .args(args)
        .arg("--data-dir")
        .arg(dir.path().join("cache"))
        .env_remove("RUST_LOG")
        .current_dir(dir.path())
        .output()
        .expect("Failed to run imageset")
}

#[test]
fn test_generate_writes_document() {
    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("imageset-config.yaml");

    let output = imageset(
        &dir,
        &[
            "generate",
            "--ocp-versions",
            "4.16.1,4.16.5",
            "--operators",
            "logging",
            "--catalog-version",
            "4.16",
            "--image",
            "registry.redhat.io/ubi9/ubi:latest",
            "--output",
            output_path.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ImageSetConfiguration saved to"));

    let yaml = fs::read_to_string(&output_path).unwrap();
    assert!(yaml.starts_with("# name: openshift-imageset"));

    let document: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();
    let mirror = &document["mirror"];
    assert_eq!(
        mirror["operators"][0]["catalog"].as_str(),
        Some("registry.redhat.io/redhat/redhat-operator-index:v4.16")
    );
    assert_eq!(mirror["operators"][0]["packages"][0]["name"].as_str(), Some("cluster-logging"));
    let channel = &mirror["platform"]["channels"][0];
    assert_eq!(channel["name"].as_str(), Some("stable-4.16"));
    assert_eq!(channel["minVersion"].as_str(), Some("4.16.1"));
    assert_eq!(channel["maxVersion"].as_str(), Some("4.16.5"));
}

#[test]
fn test_generate_prints_to_stdout_without_output() {
    let dir = TempDir::new().unwrap();
    let output = imageset(&dir, &["generate", "--image", "quay.io/org/tool:1.0", "--kubevirt"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kind: ImageSetConfiguration"));
    assert!(stdout.contains("kubeVirtContainer: true"));
}

#[test]
fn test_empty_generate_fails_with_json_report() {
    let dir = TempDir::new().unwrap();
    let output = imageset(&dir, &["generate", "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let report: Value = serde_json::from_slice(&output.stdout).expect("error report should be JSON");
    assert_eq!(report["status"], "bad_request");
    assert!(report["message"]
        .as_str()
        .unwrap()
        .contains("At least one configuration section"));
    assert!(report["timestamp"].is_string());
}

#[test]
fn test_validate_request_file() {
    let dir = TempDir::new().unwrap();
    let request = dir.path().join("request.yaml");
    fs::write(
        &request,
        "ocp_versions: ['4.16']\nadditional_images: ['registry.redhat.io/ubi9/ubi']\n",
    )
    .unwrap();

    let output = imageset(&dir, &["validate", request.to_str().unwrap(), "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);
    assert_eq!(report["warnings"].as_array().unwrap().len(), 2);
}

#[test]
fn test_validate_rejects_chart_without_repository() {
    let dir = TempDir::new().unwrap();
    let request = dir.path().join("request.json");
    fs::write(&request, r#"{"helm_charts": [{"name": "nginx"}]}"#).unwrap();

    let output = imageset(&dir, &["validate", request.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Helm chart repository is required"));
}

#[test]
fn test_mappings_lists_aliases() {
    let dir = TempDir::new().unwrap();
    let output = imageset(&dir, &["mappings"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line == "logging -> cluster-logging"));
}
