//! dockhand CLI
//!
//! Thin command-line front end over the dockhand session:
//! - container lifecycle (run, kill, stop, start, rm)
//! - listing and inspection (ps, inspect)
//! - client/server version info
//! - `argv`, which prints the argv synthesized from a JSON argument list

use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dockhand::{
    is_command_available, parameters, Arg, Asset, Config, Container, Error, FlagNames, Getopt,
    PsOptions, RmOptions, RunOptions, Session, StartOptions,
};

#[derive(Parser)]
#[command(name = "dockhand", version)]
#[command(about = "Drive the docker CLI with structured arguments", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List containers
    Ps {
        /// Show all containers (default shows just running)
        #[arg(short, long)]
        all: bool,

        /// Show only the latest created container
        #[arg(short, long)]
        latest: bool,

        /// Show containers created before this id or name
        #[arg(long)]
        before: Option<String>,

        /// Show containers created since this id or name
        #[arg(long)]
        since: Option<String>,

        /// Print rows as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print detailed information about containers as JSON
    Inspect {
        #[arg(required = true)]
        containers: Vec<String>,
    },

    /// Run a command in a new container
    Run {
        /// Run in background and print the container id
        #[arg(short, long)]
        detach: bool,

        /// Keep STDIN open
        #[arg(short, long)]
        interactive: bool,

        /// Allocate a pseudo-TTY
        #[arg(short, long)]
        tty: bool,

        /// Remove the container when it exits
        #[arg(long)]
        rm: bool,

        /// Container name
        #[arg(long)]
        name: Option<String>,

        /// Environment variables (KEY=VALUE)
        #[arg(short, long)]
        env: Vec<String>,

        /// Volumes to mount (HOST:CONTAINER)
        #[arg(short, long)]
        volume: Vec<String>,

        /// Ports to publish (HOST:CONTAINER)
        #[arg(short, long)]
        publish: Vec<String>,

        /// User name or uid
        #[arg(short, long)]
        user: Option<String>,

        #[arg(long)]
        hostname: Option<String>,

        /// Memory limit, e.g. 32m
        #[arg(short, long)]
        memory: Option<String>,

        /// Restart policy
        #[arg(long)]
        restart: Option<String>,

        image: String,

        /// Command and arguments to run inside the container
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Kill a running container
    Kill {
        container: String,

        /// Signal to send (KILL, TERM, HUP...)
        #[arg(short, long)]
        signal: Option<String>,
    },

    /// Stop a running container
    Stop {
        container: String,

        /// Seconds to wait before killing it
        #[arg(short, long)]
        time: Option<u64>,
    },

    /// Start a stopped container
    Start {
        container: String,

        #[arg(short, long)]
        attach: bool,

        #[arg(short, long)]
        interactive: bool,
    },

    /// Remove a container
    Rm {
        container: String,

        #[arg(short, long)]
        force: bool,

        /// Remove anonymous volumes too
        #[arg(short, long)]
        volumes: bool,
    },

    /// Show client and server version information
    Version,

    /// Print the argv synthesized from a JSON argument list, one token per line
    ///
    /// Example: dockhand argv '["run", {"rm": true, "v": ["/a:/b"]}, "busybox"]'
    Argv {
        /// JSON array of words, word lists and option objects
        json: String,

        /// Spell long option names with `-` instead of `_`
        #[arg(long)]
        gnu: bool,
    },
}

/// One line of `dockhand ps`
#[derive(Debug, Serialize)]
struct PsRow<'a> {
    id: String,
    name: &'a str,
    status: &'a str,
    running: bool,
}

impl<'a> From<&'a Container> for PsRow<'a> {
    fn from(container: &'a Container) -> Self {
        Self {
            id: container.short_id().unwrap_or_default(),
            name: container.name().unwrap_or(""),
            status: container.status().unwrap_or(""),
            running: container.is_running(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    init_logging(cli.verbose || config.debug);

    if let Err(e) = execute(cli.command, config) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code().filter(|c| *c != 0).unwrap_or(1));
    }
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_env("DOCKHAND_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if debug { "dockhand=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(command: Commands, config: Config) -> Result<(), Error> {
    if let Commands::Argv { json, gnu } = command {
        return print_argv(&json, gnu || config.flag_names == FlagNames::Hyphenated);
    }

    if !is_command_available(&config.program) {
        tracing::warn!(program = %config.program, "program not found in PATH");
    }

    let session = Session::with_config(config);

    match command {
        Commands::Ps {
            all,
            latest,
            before,
            since,
            json,
        } => {
            let containers = session.ps(&PsOptions {
                all,
                before,
                latest,
                since,
            })?;
            let rows: Vec<PsRow> = containers.iter().map(PsRow::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!("{:<12}  {:<24}  {}", row.id, row.name, row.status);
                }
            }
        }
        Commands::Inspect { containers } => {
            let json: Vec<_> = session
                .inspect(&containers)?
                .iter()
                .map(Asset::to_json)
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Run {
            detach,
            interactive,
            tty,
            rm,
            name,
            env,
            volume,
            publish,
            user,
            hostname,
            memory,
            restart,
            image,
            command,
        } => {
            let options = RunOptions {
                detach,
                interactive,
                tty,
                rm,
                name,
                env,
                volume,
                publish,
                user,
                hostname,
                memory,
                restart,
                ..Default::default()
            };
            print_nonempty(&session.run(&image, &command, &options)?);
        }
        Commands::Kill { container, signal } => {
            print_nonempty(&session.kill(&container, signal.as_deref())?);
        }
        Commands::Stop { container, time } => {
            print_nonempty(&session.stop(&container, time)?);
        }
        Commands::Start {
            container,
            attach,
            interactive,
        } => {
            let options = StartOptions {
                attach,
                interactive,
            };
            print_nonempty(&session.start(&container, &options)?);
        }
        Commands::Rm {
            container,
            force,
            volumes,
        } => {
            print_nonempty(&session.rm(&container, &RmOptions { force, volumes })?);
        }
        Commands::Version => print_version(&session)?,
        Commands::Argv { .. } => {}
    }

    Ok(())
}

/// Print version information
fn print_version(session: &Session) -> Result<(), Error> {
    println!("dockhand version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(host) = session.host() {
        println!("Host: {}", host);
    }
    println!();

    for (key, value) in session.version()? {
        println!("{}: {}", key, value);
    }
    Ok(())
}

fn print_argv(json: &str, gnu: bool) -> Result<(), Error> {
    let document: serde_json::Value = serde_json::from_str(json)?;
    let items = Arg::list_from_json(&document);
    let argv = if gnu {
        Getopt::gnu().parameters(&items)
    } else {
        parameters(&items)
    };
    for token in argv {
        println!("{}", token);
    }
    Ok(())
}

fn print_nonempty(output: &str) {
    if !output.is_empty() {
        println!("{}", output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ps_row_shortens_id_by_chars() {
        let container = Container::from_json(json!({
            "Id": "ééééééééééééééé",
            "Name": "/web",
            "State": {"Status": "running", "Running": true}
        }));
        let row = serde_json::to_value(PsRow::from(&container)).unwrap();
        assert_eq!(
            row,
            json!({"id": "éééééééééééé", "name": "web", "status": "running", "running": true})
        );
    }

    #[test]
    fn test_ps_row_without_fields() {
        let container = Container::from_json(json!({}));
        let row = PsRow::from(&container);
        assert_eq!(row.id, "");
        assert_eq!(row.name, "");
        assert!(!row.running);
    }
}
