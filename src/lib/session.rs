//! Docker session
//!
//! A session is bound to a program (usually `docker` from `$PATH`), an
//! optional daemon host and a [`Shell`]. Each method builds an argument
//! list, synthesizes it into argv, runs one process and parses what comes
//! back. Methods expose a subset of each subcommand's options.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::container::Container;
use crate::error::{Error, Result};
use crate::getopt::{Arg, Getopt, OptionSet};
use crate::shell::{ProcessShell, Shell};

fn line_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\r\n]+").expect("line break pattern is valid"))
}

/// Options for `docker ps`
#[derive(Debug, Clone, Default)]
pub struct PsOptions {
    /// Show stopped containers too
    pub all: bool,
    /// Only containers created before this id or name
    pub before: Option<String>,
    /// Only the latest created container
    pub latest: bool,
    /// Only containers created since this id or name
    pub since: Option<String>,
}

/// Options for `docker run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Custom host-to-IP mappings, `host:ip`
    pub add_host: Vec<String>,
    /// Streams to attach to (STDIN, STDOUT, STDERR)
    pub attach: Vec<String>,
    /// Scheduler period (μs)
    pub cpu_period: Option<u64>,
    /// Maximum runtime (μs) during one scheduler period
    pub cpu_quota: Option<u64>,
    /// Run in background and print the container id
    pub detach: bool,
    /// File to read environment variables from
    pub env_file: Option<String>,
    /// `K=V` assignments
    pub env: Vec<String>,
    /// Ports or port ranges exposed to other containers, e.g. `80`, `1024-2048`
    pub expose: Vec<String>,
    pub hostname: Option<String>,
    /// Keep STDIN open
    pub interactive: bool,
    /// Containers to link to
    pub link: Vec<String>,
    /// Memory limit, e.g. `640k`, `32m`, `4g`
    pub memory: Option<String>,
    /// Leave unset to let docker pick one
    pub name: Option<String>,
    /// Ports published to the host; `X:Y` maps host X to container Y
    pub publish: Vec<String>,
    pub publish_all: bool,
    /// Restart policy, e.g. `on-failure:3`
    pub restart: Option<String>,
    /// Remove the container once it exits
    pub rm: bool,
    /// Allocate a pseudo-TTY
    pub tty: bool,
    /// User name or uid
    pub user: Option<String>,
    /// Volumes to mount; `X:Y` maps host X to container Y
    pub volume: Vec<String>,
    /// Container to import all volumes from
    pub volumes_from: Option<String>,
}

impl RunOptions {
    /// Add one environment variable as `key=value`
    pub fn with_env(mut self, key: impl fmt::Display, value: impl fmt::Display) -> Self {
        self.env.push(format!("{}={}", key, value));
        self
    }

    pub fn to_options(&self) -> OptionSet {
        OptionSet::new()
            .with("add-host", self.add_host.as_slice())
            .with("attach", self.attach.as_slice())
            .with("cpu-period", self.cpu_period)
            .with("cpu-quota", self.cpu_quota)
            .with("detach", self.detach)
            .with("env-file", self.env_file.as_deref())
            .with("env", self.env.as_slice())
            .with("expose", self.expose.as_slice())
            .with("hostname", self.hostname.as_deref())
            .with("interactive", self.interactive)
            .with("link", self.link.as_slice())
            .with("memory", self.memory.as_deref())
            .with("name", self.name.as_deref())
            .with("publish", self.publish.as_slice())
            .with("publish-all", self.publish_all)
            .with("restart", self.restart.as_deref())
            .with("rm", self.rm)
            .with("tty", self.tty)
            .with("user", self.user.as_deref())
            .with("volume", self.volume.as_slice())
            .with("volumes-from", self.volumes_from.as_deref())
    }
}

/// Options for `docker rm`
#[derive(Debug, Clone, Default)]
pub struct RmOptions {
    /// Remove the container even if it is running
    pub force: bool,
    /// Remove associated anonymous volumes
    pub volumes: bool,
}

/// Options for `docker start`
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Attach STDOUT/STDERR and forward signals
    pub attach: bool,
    /// Attach STDIN
    pub interactive: bool,
}

#[derive(Clone)]
pub struct Session {
    shell: Arc<dyn Shell>,
    program: String,
    host: Option<String>,
    getopt: Getopt,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("program", &self.program)
            .field("host", &self.host)
            .field("getopt", &self.getopt)
            .finish()
    }
}

impl Session {
    /// Session on real processes, configured from the environment
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::from_env()?))
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_shell(ProcessShell, config)
    }

    pub fn with_shell(shell: impl Shell + 'static, config: Config) -> Self {
        Self {
            shell: Arc::new(shell),
            program: config.program,
            host: config.host,
            getopt: Getopt::with_flag_names(config.flag_names),
        }
    }

    /// URL of the docker host this session talks to
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn getopt(&self) -> &Getopt {
        &self.getopt
    }

    /// Full argv (without the program) for a subcommand
    pub fn argv(&self, subcommand: &str, args: Vec<Arg>) -> Vec<String> {
        let mut items: Vec<Arg> = Vec::with_capacity(args.len() + 2);
        if let Some(ref host) = self.host {
            items.push(OptionSet::new().with("host", host).into());
        }
        items.push(subcommand.into());
        items.extend(args);
        self.getopt.parameters(&items)
    }

    /// Run a subcommand without checking that its parameters make sense.
    ///
    /// Returns stdout as-is. A non-zero exit becomes [`Error::Execution`]
    /// carrying the subcommand name and captured stderr.
    pub fn run_command(&self, subcommand: &str, args: Vec<Arg>) -> Result<String> {
        let argv = self.argv(subcommand, args);
        debug!(program = %self.program, ?argv, "running");

        let output = self.shell.run(&self.program, &argv)?;
        if !output.success() {
            warn!(
                subcommand,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "command failed"
            );
            return Err(Error::Execution {
                command: subcommand.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }

    /// Detailed information about containers; empty input spawns nothing
    pub fn inspect<S: AsRef<str>>(&self, containers: &[S]) -> Result<Vec<Container>> {
        if containers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = containers.iter().map(|c| c.as_ref().to_string()).collect();
        let out = self.run_command("inspect", vec![ids.into()])?;
        let parsed: Vec<Value> = serde_json::from_str(&out)?;
        Ok(parsed
            .into_iter()
            .map(|json| Container::bound(json, self.clone()))
            .collect())
    }

    /// Detailed information about one container
    pub fn inspect_one(&self, container: &str) -> Result<Container> {
        self.inspect(&[container])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(container.to_string()))
    }

    /// Kill a running container, optionally with a specific signal (KILL, TERM, HUP...)
    pub fn kill(&self, container: &str, signal: Option<&str>) -> Result<String> {
        let options = OptionSet::new().with("signal", signal);
        self.run_command("kill", vec![options.into(), container.into()])
            .map(|out| out.trim().to_string())
    }

    /// List containers. Runs `ps` followed by one large `inspect`.
    pub fn ps(&self, options: &PsOptions) -> Result<Vec<Container>> {
        let options = OptionSet::new()
            .with("all", options.all)
            .with("before", options.before.as_deref())
            .with("latest", options.latest)
            .with("since", options.since.as_deref());
        let out = self.run_command("ps", vec![options.into()])?;
        self.inspect(&parse_ps_ids(&out))
    }

    /// Run a command in a new container; returns trimmed stdout
    /// (the container id when detached)
    pub fn run<S: AsRef<str>>(
        &self,
        image: &str,
        command_and_args: &[S],
        options: &RunOptions,
    ) -> Result<String> {
        let command: Vec<String> = command_and_args
            .iter()
            .map(|a| a.as_ref().to_string())
            .collect();
        let args = vec![options.to_options().into(), image.into(), command.into()];
        self.run_command("run", args)
            .map(|out| out.trim().to_string())
    }

    pub fn rm(&self, container: &str, options: &RmOptions) -> Result<String> {
        let options = OptionSet::new()
            .with("force", options.force)
            .with("volumes", options.volumes);
        self.run_command("rm", vec![options.into(), container.into()])
            .map(|out| out.trim().to_string())
    }

    /// Stop a running container, waiting `time` seconds before killing it
    pub fn stop(&self, container: &str, time: Option<u64>) -> Result<String> {
        let options = OptionSet::new().with("time", time);
        self.run_command("stop", vec![options.into(), container.into()])
            .map(|out| out.trim().to_string())
    }

    pub fn start(&self, container: &str, options: &StartOptions) -> Result<String> {
        let options = OptionSet::new()
            .with("attach", options.attach)
            .with("interactive", options.interactive);
        self.run_command("start", vec![options.into(), container.into()])
            .map(|out| out.trim().to_string())
    }

    /// Client and server version information, keyed like `Client Version`
    pub fn version(&self) -> Result<BTreeMap<String, String>> {
        let out = self.run_command("version", Vec::new())?;
        Ok(parse_version_output(&out))
    }
}

/// Parse `docker version` text into `"<Client|Server> <Key>" -> value`
pub fn parse_version_output(output: &str) -> BTreeMap<String, String> {
    let mut info = BTreeMap::new();
    let mut prefix = "";

    for line in line_breaks().split(output) {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("Client") {
            prefix = "Client ";
        } else if line.starts_with("Server") {
            prefix = "Server ";
        } else if let Some((key, value)) = line.split_once(':') {
            info.insert(format!("{}{}", prefix, key.trim()), value.trim().to_string());
        }
    }

    info
}

/// Container ids from `docker ps` output
///
/// The first non-blank line is the header, whatever `psFormat` made of it,
/// and is always skipped.
pub fn parse_ps_ids(output: &str) -> Vec<String> {
    line_breaks()
        .split(output)
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
