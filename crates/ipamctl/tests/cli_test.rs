//! Integration tests for the `ipamctl` CLI binary.
//!
//! Argument parsing, help output, shell completions, and error handling
//! run without an appliance; the end-to-end cases talk to a wiremock one.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `ipamctl` binary with env isolation.
///
/// Clears all `IPAM_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn ipamctl_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ipamctl");
    cmd.env("HOME", "/tmp/ipamctl-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/ipamctl-test-nonexistent")
        .env_remove("IPAM_PROFILE")
        .env_remove("IPAM_HOST")
        .env_remove("IPAM_PORT")
        .env_remove("IPAM_USERNAME")
        .env_remove("IPAM_PASSWORD")
        .env_remove("IPAM_CONFIGURATION")
        .env_remove("IPAM_VIEW")
        .env_remove("IPAM_OUTPUT")
        .env_remove("IPAM_INSECURE")
        .env_remove("IPAM_TIMEOUT");
    cmd
}

/// Command pointed at `server` over plain HTTP with working credentials.
fn against(server: &MockServer) -> assert_cmd::Command {
    let addr = server.address();
    let mut cmd = ipamctl_cmd();
    cmd.env("IPAM_PASSWORD", "pw").args([
        "--http",
        "--host",
        &addr.ip().to_string(),
        "--port",
        &addr.port().to_string(),
        "--username",
        "admin",
    ]);
    cmd
}

async fn appliance() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t0k"})))
        .mount(&server)
        .await;
    server
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = ipamctl_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    ipamctl_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("IPAM")
            .and(predicate::str::contains("network"))
            .and(predicate::str::contains("zone"))
            .and(predicate::str::contains("ptr")),
    );
}

#[test]
fn test_version_flag() {
    ipamctl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ipamctl"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    ipamctl_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    ipamctl_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ipamctl"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = ipamctl_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_no_profile_and_no_host() {
    ipamctl_cmd()
        .args(["configuration", "get", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn test_config_show_no_config() {
    ipamctl_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_invalid_output_format() {
    let output = ipamctl_cmd()
        .args(["--output", "invalid", "zone", "get", "example.com"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("possible values") || text.contains("invalid"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_network_get_needs_cidr_or_allocated_id() {
    let output = ipamctl_cmd().args(["network", "get"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_zone_subcommands_exist() {
    ipamctl_cmd()
        .args(["zone", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("create")
                .and(predicate::str::contains("update"))
                .and(predicate::str::contains("deploy"))
                .and(predicate::str::contains("roles")),
        );
}

#[test]
fn test_ip_subcommands_exist() {
    ipamctl_cmd()
        .args(["ip", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("allocate")
                .and(predicate::str::contains("update"))
                .and(predicate::str::contains("release")),
        );
}

#[test]
fn test_config_subcommands_exist() {
    ipamctl_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("set-password")),
        );
}

// ── Against a mock appliance ────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_configuration_get_renders_json() {
    let server = appliance().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/configurations/prod/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "name": "prod",
            "properties": "description=lab|"
        })))
        .expect(1)
        .mount(&server)
        .await;

    against(&server)
        .args(["-o", "json", "configuration", "get", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"prod\"").and(predicate::str::contains("description=lab|")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_object_exits_not_found() {
    let server = appliance().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/configurations/ghost/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Object does not exist"))
        .mount(&server)
        .await;

    let output = against(&server)
        .args(["configuration", "get", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_yes_refuses_when_not_interactive() {
    let server = appliance().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let output = against(&server)
        .args(["configuration", "delete", "prod"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_block_commands_need_a_configuration() {
    let server = appliance().await;

    let output = against(&server)
        .args(["block", "get", "10.0.0.0/8"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("configuration"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let output = against(&server)
        .args(["configuration", "get", "prod"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
