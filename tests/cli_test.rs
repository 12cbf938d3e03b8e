//! Tests for the dockhand binary
//!
//! Runs the built CLI against a shell script standing in for docker.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

const STUB: &str = r#"#!/bin/sh
case "$1" in
  kill)
    echo "Error response from daemon: Cannot kill container: $2" >&2
    exit 7
    ;;
  ps)
    echo "CONTAINER ID   IMAGE     COMMAND   CREATED         STATUS         PORTS     NAMES"
    echo "0fd4b1e3a2c1   busybox   sh        2 minutes ago   Up 2 minutes             web"
    ;;
  inspect)
    echo '[{"Id": "0fd4b1e3a2c1ffffffff", "Name": "/web", "State": {"Status": "running", "Running": true}}]'
    ;;
  *)
    for arg in "$@"; do
      printf '%s\n' "$arg"
    done
    ;;
esac
"#;

/// Writing an executable while another test forks can fail with ETXTBSY
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

fn create_stub() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("docker");
    fs::write(&path, STUB).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    (temp_dir, path)
}

fn dockhand(program: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dockhand"))
        .args(args)
        .env("DOCKHAND_DOCKER", program)
        .env_remove("DOCKER_HOST")
        .env_remove("DOCKHAND_HYPHENATE_FLAGS")
        .env_remove("DOCKHAND_DEBUG")
        .env_remove("DOCKHAND_LOG")
        .output()
        .expect("failed to run dockhand")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_argv_prints_one_token_per_line() {
    let _guard = serial();
    let (_temp, stub) = create_stub();

    let output = dockhand(
        &stub,
        &["argv", r#"["docker", "run", {"rm": true, "v": ["/a:/b", false]}, "hello_world"]"#],
    );

    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["docker", "run", "--rm", "-v", "/a:/b", "hello_world"]
    );
}

#[test]
fn test_argv_gnu_hyphenates_long_names() {
    let _guard = serial();
    let (_temp, stub) = create_stub();

    let output = dockhand(&stub, &["argv", "--gnu", r#"[{"publish_all": true}]"#]);

    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["--publish-all"]);
}

#[test]
fn test_argv_rejects_malformed_json() {
    let _guard = serial();
    let (_temp, stub) = create_stub();

    let output = dockhand(&stub, &["argv", "[\"run\""]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("JSON error"));
}

#[test]
fn test_stop_passes_options_to_the_program() {
    let _guard = serial();
    let (_temp, stub) = create_stub();

    let output = dockhand(&stub, &["stop", "web", "-t", "0"]);

    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["stop", "--time=0", "web"]);
}

#[test]
fn test_ps_json_rows() {
    let _guard = serial();
    let (_temp, stub) = create_stub();

    let output = dockhand(&stub, &["ps", "--json"]);

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        rows,
        serde_json::json!([
            {"id": "0fd4b1e3a2c1", "name": "web", "status": "running", "running": true}
        ])
    );
}

#[test]
fn test_execution_failure_passes_exit_code_through() {
    let _guard = serial();
    let (_temp, stub) = create_stub();

    let output = dockhand(&stub, &["kill", "web"]);

    assert_eq!(output.status.code(), Some(7));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: kill failed with exit code 7"));
    assert!(stderr.contains("Cannot kill container: web"));
    assert!(output.stdout.is_empty());
}
