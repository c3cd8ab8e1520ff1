//! Integration tests for the llm-council binary

use std::process::Command;

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_llm-council"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Fan-out queries to a council of LLM backends"));
    assert!(stdout.contains("--models"));
    assert!(stdout.contains("--timeout"));
    assert!(stdout.contains("--config"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_llm-council"))
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("llm-council"));
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_show_config_uses_environment() {
    let dir = std::env::temp_dir().join(format!("llm-council-cli-{}", std::process::id()));
    let path = dir.join("config.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_llm-council"))
        .args(["--show-config", "--config"])
        .arg(&path)
        .env("ROUTER_TYPE", "ollama")
        .env("COUNCIL_MODELS", "a:1,b:2")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("router = \"ollama\""));
    assert!(stdout.contains("\"a:1\""));
    assert!(stdout.contains("\"b:2\""));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_oversized_timeout_is_a_config_error() {
    let dir = std::env::temp_dir().join(format!("llm-council-timeout-{}", std::process::id()));
    let path = dir.join("config.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_llm-council"))
        .args(["--timeout", "1e20", "--config"])
        .arg(&path)
        .arg("hello")
        .env("ROUTER_TYPE", "ollama")
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("invalid configuration"));
    assert!(!stderr.contains("panicked"));

    let _ = std::fs::remove_dir_all(&dir);
}
