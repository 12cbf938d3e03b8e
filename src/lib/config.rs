//! Configuration from environment variables
//!
//! - DOCKHAND_DOCKER            program to invoke (default: docker)
//! - DOCKER_HOST                daemon address, passed as --host
//! - DOCKHAND_HYPHENATE_FLAGS   spell long option names with `-` instead of `_`
//! - DOCKHAND_DEBUG             enable debug logging in the CLI

use std::env;

use crate::error::{Error, Result};
use crate::getopt::FlagNames;

pub const DEFAULT_PROGRAM: &str = "docker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Program to invoke
    pub program: String,
    /// Docker host URL, if any
    pub host: Option<String>,
    /// Spelling of long option names
    pub flag_names: FlagNames,
    /// Debug logging
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            host: None,
            flag_names: FlagNames::Verbatim,
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let program = match env::var("DOCKHAND_DOCKER") {
            Ok(p) if p.trim().is_empty() => {
                return Err(Error::Config("DOCKHAND_DOCKER is set but empty".to_string()))
            }
            Ok(p) => p,
            Err(_) => DEFAULT_PROGRAM.to_string(),
        };

        let flag_names = if env_bool("DOCKHAND_HYPHENATE_FLAGS") {
            FlagNames::Hyphenated
        } else {
            FlagNames::Verbatim
        };

        Ok(Self {
            program,
            host: env::var("DOCKER_HOST").ok().filter(|h| !h.is_empty()),
            flag_names,
            debug: env_bool("DOCKHAND_DEBUG"),
        })
    }
}

pub(crate) fn env_bool(name: &str) -> bool {
    env::var(name).is_ok_and(|v| v == "1" || v == "true")
}
