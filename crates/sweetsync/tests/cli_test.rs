//! Integration tests for the `sweetsync` binary.
//!
//! Argument parsing, help, completions and exit codes, plus a few
//! round trips against a wiremock service.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// The binary with an isolated, empty config location and no
/// `SWEETSYNC_*` environment.
fn sweetsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sweetsync");
    cmd.env("HOME", "/tmp/sweetsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/sweetsync-cli-test-nonexistent")
        .env_remove("SWEETSYNC_PROFILE")
        .env_remove("SWEETSYNC_SERVER")
        .env_remove("SWEETSYNC_TOKEN")
        .env_remove("SWEETSYNC_OUTPUT")
        .env_remove("SWEETSYNC_INSECURE")
        .env_remove("SWEETSYNC_TIMEOUT")
        .env_remove("SWEETSYNC_USERNAME")
        .env_remove("SWEETSYNC_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Pointed at `server` with a token, so no keyring lookups happen.
fn against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = sweetsync_cmd();
    cmd.args(["--server", &format!("{}/api", server.uri()), "--token", "tok-cli"]);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn shop() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .and(header("authorization", "Bearer tok-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Fudge", "category": "Candy", "price": 2.5, "quantity": 0},
            {"id": 2, "name": "Lemonade", "category": "Drink", "price": 1.25, "quantity": 8}
        ])))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sweetsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    sweetsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("items")
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("register")),
    );
}

#[test]
fn test_version_flag() {
    sweetsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sweetsync"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    sweetsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    sweetsync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Usage errors ────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = sweetsync_cmd().arg("foobar").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("foobar"));
}

#[test]
fn test_restock_requires_positive_quantity() {
    sweetsync_cmd()
        .args(["items", "restock", "1", "-n", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_items_list_without_config() {
    let output = sweetsync_cmd().args(["items", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("config init"), "Expected setup hint:\n{text}");
}

#[test]
fn test_unknown_profile() {
    let output = sweetsync_cmd()
        .args(["--profile", "nope", "items", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_config_path() {
    sweetsync_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_connection_refused_exit_code() {
    sweetsync_cmd()
        .args([
            "--server",
            "http://127.0.0.1:9/api",
            "--token",
            "t",
            "--timeout",
            "2",
            "items",
            "list",
        ])
        .assert()
        .code(7);
}

// ── Against a mock service ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_items_list_json() {
    let server = shop().await;

    let output = against(&server)
        .args(["-o", "json-compact", "items", "list", "--in-stock"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["name"], "Lemonade");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_items_get_plain() {
    let server = shop().await;

    against(&server)
        .args(["-o", "plain", "items", "get", "2"])
        .assert()
        .success()
        .stdout("2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_items_get_unknown_is_not_found() {
    let server = shop().await;

    against(&server)
        .args(["items", "get", "42"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("42"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_purchase_out_of_stock_is_rejected() {
    let server = shop().await;
    Mock::given(method("POST"))
        .and(path("/api/sweets/1/purchase"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Out of stock"})))
        .expect(1)
        .mount(&server)
        .await;

    against(&server)
        .args(["items", "purchase", "1"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Out of stock"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restock_prints_updated_item() {
    let server = shop().await;
    Mock::given(method("POST"))
        .and(path("/api/sweets/1/restock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "name": "Fudge", "category": "Candy", "price": 2.5, "quantity": 12
        })))
        .mount(&server)
        .await;

    against(&server)
        .args(["items", "restock", "1", "-n", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quantity:  12"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_needs_yes_without_a_terminal() {
    let server = shop().await;
    Mock::given(method("DELETE"))
        .and(path("/api/sweets/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    against(&server)
        .args(["items", "delete", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami() {
    let server = shop().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "email": "admin@shop.test", "role": "admin"
        })))
        .mount(&server)
        .await;

    against(&server)
        .args(["-o", "plain", "whoami"])
        .assert()
        .success()
        .stdout("admin@shop.test\n");
}
