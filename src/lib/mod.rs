//! dockhand library
//!
//! Drives the docker CLI: structured arguments are synthesized into argv,
//! run as one subprocess per call, and the output parsed back into typed
//! values.

pub mod config;
pub mod container;
pub mod error;
pub mod getopt;
pub mod session;
pub mod shell;

// Re-export commonly used items
pub use config::{Config, DEFAULT_PROGRAM};
pub use container::{Asset, Container};
pub use error::{Error, Result};
pub use getopt::{parameters, Arg, FlagNames, Getopt, OptionSet, OptionValue};
pub use session::{
    parse_ps_ids, parse_version_output, PsOptions, RmOptions, RunOptions, Session, StartOptions,
};
pub use shell::{is_command_available, CommandOutput, ProcessShell, Shell};
