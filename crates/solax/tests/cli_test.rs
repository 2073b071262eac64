//! Integration tests for the `solax` CLI binary.
//!
//! Argument parsing, help output, completions, config management, and
//! polling against a wiremock endpoint. Nothing touches the user's real
//! configuration.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `solax` binary with env isolation.
///
/// Clears all `SOLAX_*` env vars and points config directories at a
/// nonexistent path.
fn solax_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("solax");
    cmd.env("HOME", "/tmp/solax-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/solax-cli-test-nonexistent")
        .env_remove("SOLAX_SITE")
        .env_remove("SOLAX_CONFIG")
        .env_remove("SOLAX_OUTPUT")
        .env_remove("SOLAX_TIMEOUT")
        .env_remove("SOLAX_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// `solax_cmd` bound to a config file.
fn solax_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = solax_cmd();
    cmd.arg("--config").arg(config);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn realtime_body() -> String {
    let mut slots: Vec<String> = (0..68).map(|i| format!("{i}.0")).collect();
    slots[18] = String::new();
    format!(
        r#"{{"method":"uploadsn","version":"Solax_SI_CH_2nd","type":"AL_SE","SN":"XYZ789","Data":[{}],"Status":2}}"#,
        slots.join(",")
    )
}

async fn mock_realtime(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/realTimeData.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(realtime_body()))
        .mount(server)
        .await;
}

fn local_arg(server: &MockServer) -> String {
    let addr = server.address();
    format!("{}:{}", addr.ip(), addr.port())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = solax_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    solax_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("SolaX")
            .and(predicate::str::contains("fetch"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("sensors")),
    );
}

#[test]
fn test_version_flag() {
    solax_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("solax"));
}

#[test]
fn test_completions_bash() {
    solax_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_conflicting_targets_rejected() {
    let output = solax_cmd()
        .args(["fetch", "--local", "10.0.0.2", "--battery", "123"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Sensors ─────────────────────────────────────────────────────────

#[test]
fn test_sensors_battery_lists_units() {
    solax_cmd()
        .args(["sensors", "battery"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Remaining Capacity")
                .and(predicate::str::contains("°C"))
                .and(predicate::str::contains("%")),
        );
}

#[test]
fn test_sensors_local_plain() {
    let output = solax_cmd()
        .args(["sensors", "local", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 24);
    assert!(stdout.lines().any(|l| l == "Grid Frequency"));
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("solax.toml");
    solax_with_config(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("solax.toml"));
}

#[test]
fn test_fetch_without_sites_reports_no_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = solax_with_config(&dir.path().join("config.toml"))
        .arg("fetch")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("No sites configured"), "{text}");
}

#[test]
fn test_cloud_target_requires_token() {
    let output = solax_cmd()
        .args(["fetch", "--battery", "123"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_zero_timeout_rejected() {
    let output = solax_cmd()
        .args(["--timeout", "0", "fetch", "--local", "10.0.0.2"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("timeout"));
}

#[test]
fn test_config_add_list_and_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let add = |name: &str| {
        solax_with_config(&config)
            .args([
                "config",
                "add",
                name,
                "--kind",
                "local",
                "--ip-address",
                "10.0.0.2",
                "--port",
                "8080",
                "--no-verify",
                "--non-interactive",
            ])
            .output()
            .unwrap()
    };

    assert!(add("garage").status.success());

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains(r#"default_site = "garage""#), "{saved}");
    assert!(saved.contains(r#"ip_address = "10.0.0.2""#), "{saved}");

    solax_with_config(&config)
        .args(["config", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("garage *"));

    let dup = add("again");
    assert_eq!(dup.status.code(), Some(6), "{}", combined_output(&dup));
}

#[test]
fn test_config_use_unknown_site() {
    let dir = tempfile::tempdir().unwrap();
    let output = solax_with_config(&dir.path().join("config.toml"))
        .args(["config", "use", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_config_show_masks_token() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[sites.roof]\nkind = \"battery\"\nsite_id = \"123\"\ntoken = \"supersecret\"\n",
    )
    .unwrap();

    let output = solax_with_config(&config)
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("supersecret"));
    assert!(stdout.contains("********"));
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_local_prints_realtime_sensors() {
    let server = MockServer::start().await;
    mock_realtime(&server).await;
    let target = local_arg(&server);

    let output = tokio::task::spawn_blocking(move || {
        solax_cmd()
            .args(["fetch", "--local", &target, "-o", "json"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let readings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let readings = readings.as_array().unwrap();
    assert_eq!(readings.len(), 24);

    let grid = readings
        .iter()
        .find(|r| r["name"] == "Grid Frequency")
        .unwrap();
    assert_eq!(grid["value"], json!(50.0));
    assert_eq!(grid["unit"], "Hz");
    assert_eq!(grid["stale"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_cloud_battery_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/site/BatteryList/SITE123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "batList": [{
                    "dataDict": [
                        { "key": "b1_1", "name": "Voltage", "value": 52.3, "unit": "V" },
                        { "key": "b1_5", "name": "Remaining Capacity", "value": 87, "unit": "%" }
                    ]
                }]
            }]
        })))
        .mount(&server)
        .await;
    let base_url = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        solax_cmd()
            .env("SOLAX_DEFAULTS__BASE_URL", base_url)
            .args([
                "--site", "roof", "fetch", "--battery", "SITE123", "--token", "tok", "-o", "plain",
            ])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("roof.Voltage=52.3"), "{stdout}");
    assert!(stdout.contains("roof.Remaining Capacity=87"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_unreachable_site_is_not_ready() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/realTimeData.htm"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let target = local_arg(&server);

    let output = tokio::task::spawn_blocking(move || {
        solax_cmd()
            .args(["fetch", "--local", &target])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("not ready"));
}
