//! Command-Line Tests
//!
//! These tests run the `ocsp-eval` binary with chains that fail before any
//! request is sent, so they need no network access.

use ocsp_eval::EvaluationReport;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../ocsp-check/tests/data")
        .join(name);
    std::fs::read(path).expect("Failed to read fixture")
}

fn run(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ocsp-eval"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start ocsp-eval");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin)
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for ocsp-eval")
}

fn chain(names: &[&str]) -> Vec<u8> {
    names.iter().flat_map(|name| fixture(name)).collect()
}

fn report(output: &Output) -> EvaluationReport {
    serde_json::from_slice(&output.stdout).expect("stdout should be an evaluation report")
}

#[test]
fn test_fewer_than_two_certificates() {
    let output = run(&[], &fixture("leaf-good.pem"));
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Fewer than 2 certificates provided on stdin"),
        "{stderr}"
    );
}

#[test]
fn test_invalid_pem() {
    let output = run(
        &[],
        b"-----BEGIN CERTIFICATE-----\n!!!!\n-----END CERTIFICATE-----\n",
    );
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error reading certificate chain"), "{stderr}");
}

#[test]
fn test_no_responder_report() {
    let output = run(&[], &chain(&["leaf-no-aia.pem", "ca.pem"]));
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("{\n\t\"error\""), "{stdout}");

    let report = report(&output);
    assert_eq!(
        report.error.as_deref(),
        Some("certificate does not contain an HTTP OCSP responder URL")
    );
    assert_eq!(report.responder_url, None);
    assert_eq!(report.request_bytes, None);
    assert_eq!(report.response_bytes, None);
    assert_eq!(report.response_time, "0ns");
}

#[test]
fn test_no_check_report() {
    let output = run(
        &["--user-agent", "ocsp-eval-tests"],
        &chain(&["responder.pem", "ca.pem"]),
    );
    assert_eq!(output.status.code(), Some(0));
    let report = report(&output);
    assert!(report
        .error
        .as_deref()
        .is_some_and(|e| e.contains("OCSP No Check")));
}

#[test]
fn test_settings_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(file, r#"{{"user_agent": "from-file/1.0", "connect_timeout_secs": 3}}"#)
        .expect("Failed to write settings");
    let path = file.path().to_string_lossy().into_owned();

    let output = run(
        &["--config", &path, "--timeout-secs", "5"],
        &chain(&["leaf-no-aia.pem", "ca.pem"]),
    );
    assert_eq!(output.status.code(), Some(0));
    assert!(report(&output).error.is_some());
}

#[test]
fn test_invalid_settings_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(file, r#"{{"connect_timeout_secs": 0}}"#).expect("Failed to write settings");
    let path = file.path().to_string_lossy().into_owned();

    let output = run(&["--config", &path], &chain(&["leaf-no-aia.pem", "ca.pem"]));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect_timeout_secs"), "{stderr}");
}

#[test]
fn test_huge_timeout_is_ignored() {
    let output = run(
        &["--timeout-secs", "18446744073709551615"],
        &chain(&["leaf-no-aia.pem", "ca.pem"]),
    );
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        report(&output).error.as_deref(),
        Some("certificate does not contain an HTTP OCSP responder URL")
    );
}
