//! Error types for dockhand
//!
//! The argument synthesizer never fails; everything here comes from the
//! session layer (spawning the CLI, non-zero exits, decoding its output).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The CLI ran and exited unsuccessfully
    #[error("{command} failed with exit code {}: {}", display_code(.exit_code), trimmed(.stderr))]
    Execution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The CLI could not be started at all
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Disconnected from session")]
    Disconnected,

    #[error("No such container: {0}")]
    NotFound(String),

    /// Inspect JSON carried no `Id` to address the container by
    #[error("Container has no Id")]
    MissingId,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Execution { .. } => "EXECUTION_FAILED",
            Error::Spawn { .. } => "SPAWN_FAILED",
            Error::Json(_) => "JSON_ERROR",
            Error::Disconnected => "DISCONNECTED",
            Error::NotFound(_) => "NOT_FOUND",
            Error::MissingId => "MISSING_ID",
            Error::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Exit code of the failed child, when there was one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Execution { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn trimmed(stderr: &str) -> &str {
    stderr.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_message() {
        let err = Error::Execution {
            command: "inspect".to_string(),
            exit_code: Some(1),
            stderr: "Error: No such object: nope\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "inspect failed with exit code 1: Error: No such object: nope"
        );
        assert_eq!(err.code(), "EXECUTION_FAILED");
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn test_execution_error_without_code() {
        let err = Error::Execution {
            command: "run".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("N/A"));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_disconnected_code() {
        assert_eq!(Error::Disconnected.code(), "DISCONNECTED");
        assert_eq!(Error::Disconnected.to_string(), "Disconnected from session");
    }

    #[test]
    fn test_missing_id_code() {
        assert_eq!(Error::MissingId.code(), "MISSING_ID");
        assert_eq!(Error::MissingId.to_string(), "Container has no Id");
        assert_eq!(Error::MissingId.exit_code(), None);
    }
}
