//! Integration tests for the vbroute-cli binary.

use crate::helpers::{fixture_path, run_cli};

fn path(name: &str) -> String {
    fixture_path(name).display().to_string()
}

#[test]
fn cli_info() {
    let Some(output) = run_cli(&["info", &path("terse_30.json")]) else {
        return;
    };
    assert!(output.status.success(), "exit code: {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("distribution: vbucket"), "got: {stdout}");
    assert!(stdout.contains("vbuckets:     1024"), "got: {stdout}");
}

#[test]
fn cli_map_json() {
    let Some(output) = run_cli(&["--format", "json", "map", &path("full_25.json"), "Hello"]) else {
        return;
    };
    assert!(output.status.success(), "exit code: {:?}", output.status);
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc[0]["vbucket"], 982);
    assert_eq!(doc[0]["authority"], "192.168.4.103:11210");
}

#[test]
fn cli_remap() {
    let Some(output) = run_cli(&["remap", &path("full_25.json"), "982", "2"]) else {
        return;
    };
    assert!(output.status.success(), "exit code: {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("try server 3 (192.168.4.104:11210)"),
        "got: {stdout}"
    );
}

#[test]
fn cli_generate_then_load() {
    let Some(output) = run_cli(&["--format", "json", "generate", "--servers", "3", "--vbuckets", "64"])
    else {
        return;
    };
    assert!(output.status.success(), "exit code: {:?}", output.status);
    let cfg = vbroute::Config::from_json(&output.stdout).unwrap();
    assert_eq!(cfg.server_count(), 3);
    assert_eq!(cfg.vbucket_count(), 64);
}

#[test]
fn cli_diff() {
    let Some(output) = run_cli(&["diff", &path("terse_25.json"), &path("terse_30.json")]) else {
        return;
    };
    assert!(output.status.success(), "exit code: {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("change:               no change"), "got: {stdout}");
}

#[test]
fn cli_bad_config_fails() {
    let Some(output) = run_cli(&["info", &path("bad.json")]) else {
        return;
    };
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed config"), "got: {stderr}");
}
