//! Black-box tests for the spark-verify binary.

use std::process::Command;

use tempfile::TempDir;

const REQUEST: &str = r#"{
  "headers": {
    "X-VaultAPISignature-URL": "https://example.com/hook",
    "x-vaultapisignature-certificateid": "cert1",
    "Content-Type": "application/json"
  },
  "body": "{\"event\":\"x\"}",
  "url": "https://example.com/hook"
}"#;

fn spark_verify() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_spark-verify"));
    for var in [
        "VAULT_HOSTNAME",
        "VAULT_USER",
        "VAULT_PASSWORD",
        "SPARK_VERIFY_CERT_DIR",
    ] {
        command.env_remove(var);
    }
    command.env("RUST_LOG", "off");
    command
}

fn write_request(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("request.json");
    std::fs::write(&path, REQUEST).unwrap();
    path
}

#[test]
fn test_canonicalize_prints_canonical_string() {
    let temp_dir = TempDir::new().unwrap();
    let request = write_request(&temp_dir);

    let output = spark_verify()
        .arg("canonicalize")
        .arg(&request)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "x-vaultapisignature-certificateid:cert1\nx-vaultapisignature-url:https://example.com/hook\n{\"event\":\"x\"}\nhttps://example.com/hook"
    );
}

#[test]
fn test_validate_without_config_is_server_error() {
    let temp_dir = TempDir::new().unwrap();
    let request = write_request(&temp_dir);

    let output = spark_verify()
        .arg("--cert-dir")
        .arg(temp_dir.path().join("certs"))
        .arg("validate")
        .arg(&request)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_canonicalize_missing_file_fails() {
    let output = spark_verify()
        .arg("canonicalize")
        .arg("/nonexistent/request.json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}
