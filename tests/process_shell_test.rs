//! End-to-end tests with real child processes
//!
//! A small shell script stands in for docker: it echoes its argv one
//! token per line, or fails for the `kill` subcommand.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use dockhand::{Config, Error, RunOptions, Session};
use tempfile::TempDir;

const STUB: &str = r#"#!/bin/sh
if [ "$1" = "kill" ]; then
  echo "Error response from daemon: Cannot kill container: $2" >&2
  exit 7
fi
for arg in "$@"; do
  printf '%s\n' "$arg"
done
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

fn create_session(program: &Path) -> Session {
    Session::with_config(Config {
        program: program.to_string_lossy().to_string(),
        ..Config::default()
    })
}

#[test]
fn test_argv_reaches_the_process_unquoted() {
    let _guard = serial();
    let (_temp, stub) = create_stub();
    let session = create_session(&stub);

    let options = RunOptions {
        rm: true,
        env: vec!["GREETING=hello world".to_string()],
        volume: vec!["/a:/b".to_string()],
        ..Default::default()
    };
    let out = session
        .run("busybox", &["sh", "-c", "echo $GREETING"], &options)
        .unwrap();

    let tokens: Vec<&str> = out.lines().collect();
    assert_eq!(
        tokens,
        vec![
            "run",
            "--env=GREETING=hello world",
            "--rm",
            "--volume=/a:/b",
            "busybox",
            "sh",
            "-c",
            "echo $GREETING",
        ]
    );
}

#[test]
fn test_non_zero_exit_surfaces_stderr() {
    let _guard = serial();
    let (_temp, stub) = create_stub();
    let session = create_session(&stub);

    let err = session.kill("web", None).unwrap_err();
    match err {
        Error::Execution {
            command,
            exit_code,
            stderr,
        } => {
            assert_eq!(command, "kill");
            assert_eq!(exit_code, Some(7));
            assert!(stderr.contains("Cannot kill container: web"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_missing_program() {
    let _guard = serial();
    let temp_dir = TempDir::new().unwrap();
    let session = create_session(&temp_dir.path().join("no-such-docker"));
    let err = session.version().unwrap_err();
    assert_eq!(err.code(), "SPAWN_FAILED");
}
