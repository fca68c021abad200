//! Integration tests for the `syrlink` CLI binary.
//!
//! The first half validates argument parsing, help output, shell
//! completions and error handling without any network. The second half
//! runs the real binary against a wiremock stand-in for the SYR cloud.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use syrlink_api::crypto::WireCodec;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `syrlink` binary with env isolation.
///
/// Clears all `SYRLINK_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn syrlink_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("syrlink");
    isolate(&mut cmd, "/tmp/syrlink-cli-test-nonexistent");
    cmd
}

fn isolate(cmd: &mut assert_cmd::Command, home: &str) {
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("SYRLINK_ACCOUNT")
        .env_remove("SYRLINK_USERNAME")
        .env_remove("SYRLINK_PASSWORD")
        .env_remove("SYRLINK_BASE_URL")
        .env_remove("SYRLINK_OUTPUT")
        .env_remove("SYRLINK_TIMEOUT")
        .env_remove("SYRLINK_DEFAULT_ACCOUNT");
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
    let output = syrlink_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    syrlink_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("SYR")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("regenerate"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    syrlink_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("syrlink"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    syrlink_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    syrlink_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    syrlink_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = syrlink_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_status_without_credentials() {
    let output = syrlink_cmd().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("credentials") || text.contains("config init"),
        "Expected a credentials hint:\n{text}"
    );
}

#[test]
fn test_config_show_no_config() {
    // `config show` uses load_config_or_default() so it succeeds even
    // when no config file exists — it just renders the default config.
    syrlink_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_invalid_output_format() {
    let output = syrlink_cmd()
        .args(["--output", "invalid", "devices"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse — the failure must be about missing
    // credentials, not about argument parsing.
    let output = syrlink_cmd()
        .args(["--output", "json", "--verbose", "--timeout", "60", "devices"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
}

#[test]
fn test_unknown_account_fails() {
    // No config file exists, so any named account has no credentials.
    syrlink_cmd()
        .args(["--account", "nope", "status"])
        .assert()
        .failure()
        .code(3);
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_config_subcommands_exist() {
    syrlink_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("accounts"))
                .and(predicate::str::contains("set-password")),
        );
}

#[test]
fn test_command_aliases() {
    syrlink_cmd().args(["st", "--help"]).assert().success();
    syrlink_cmd().args(["ls", "--help"]).assert().success();
    syrlink_cmd().args(["regen", "--help"]).assert().success();
}

#[test]
fn test_stats_kind_flag() {
    syrlink_cmd()
        .args(["stats", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("water").and(predicate::str::contains("salt")));
}

// ── End-to-end against a mock backend ───────────────────────────────

const LOGIN_PATH: &str = "/WebServices/Api/SyrApiService.svc/REST/GetProjects";
const DEVICE_LIST_PATH: &str =
    "/WebServices/SyrControlWebServiceTest2.asmx/GetProjectDeviceCollections";
const STATUS_PATH: &str = "/WebServices/SyrControlWebServiceTest2.asmx/GetDeviceCollectionStatus";

const LOGIN_DOC: &str = r#"<sc><api version="1.0"><usr id="edd95b6f-3b22"/><prs><pre id="p-1" n="Zuhause"/></prs></api></sc>"#;
const DEVICE_LIST_DOC: &str = r#"<sc><col><dcl dclg="c-1" ali="Keller"/></col><dvs><d dclg="c-1" sn="210836887"/></dvs><cs v="AB"/></sc>"#;
const STATUS_DOC: &str = r#"<sc><dvs><d dg="c-1" sbt="7" sta="2"><c n="getCNA" v="LEXplus10SL"/><c n="getPRS" v="39"/><c n="getSRE" v="0"/><c n="getRES" v="720"/></d></dvs><cs v="AB"/></sc>"#;

fn encrypted(doc: &str) -> String {
    WireCodec::vendor_default().encrypt(doc)
}

async fn mount(server: &MockServer, endpoint: &str, doc: &str) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_string(encrypted(doc)))
        .mount(server)
        .await;
}

/// Write a minimal account config under `{home}/syrlink/config.toml`.
fn write_config(home: &std::path::Path, base_url: &str) {
    let config_dir = home.join("syrlink");
    std::fs::create_dir_all(&config_dir).unwrap();
    let config = format!(
        "default_account = \"test\"\n\n\
         [accounts.test]\n\
         username = \"kunde@example.com\"\n\
         password = \"geheim\"\n\
         base_url = \"{base_url}\"\n"
    );
    std::fs::write(config_dir.join("config.toml"), config).unwrap();
}

/// Run the binary with its config rooted at `home`, blocking off-runtime.
async fn run_syrlink(home: std::path::PathBuf, args: &[&str]) -> std::process::Output {
    let args: Vec<String> = args.iter().map(|s| (*s).to_owned()).collect();
    tokio::task::spawn_blocking(move || {
        let mut cmd = cargo_bin_cmd!("syrlink");
        isolate(&mut cmd, home.to_str().unwrap());
        cmd.args(&args);
        cmd.output().unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_end_to_end() {
    let server = MockServer::start().await;
    mount(&server, LOGIN_PATH, LOGIN_DOC).await;
    mount(&server, DEVICE_LIST_PATH, DEVICE_LIST_DOC).await;

    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &format!("{}/WebServices/", server.uri()));

    let output = run_syrlink(dir.path().to_path_buf(), &["devices"]).await;

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("210836887"), "stdout:\n{stdout}");
    assert!(stdout.contains("Keller"), "stdout:\n{stdout}");
    assert!(stdout.contains("Zuhause"), "stdout:\n{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_detail_end_to_end() {
    let server = MockServer::start().await;
    mount(&server, LOGIN_PATH, LOGIN_DOC).await;
    mount(&server, DEVICE_LIST_PATH, DEVICE_LIST_DOC).await;
    mount(&server, STATUS_PATH, STATUS_DOC).await;

    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &format!("{}/WebServices/", server.uri()));

    let output = run_syrlink(dir.path().to_path_buf(), &["status", "210836887"]).await;

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("LEXplus10SL"), "stdout:\n{stdout}");
    assert!(stdout.contains("3.9 bar"), "stdout:\n{stdout}");
    assert!(stdout.contains("720 l"), "stdout:\n{stdout}");
}
