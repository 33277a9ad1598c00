//! fleetops CLI
//!
//! Operator tooling for a managed fleet:
//! - `exec`: run one command on many hosts at once
//! - `connect`: interactive terminal session on one host
//! - `hosts`: inventory listing with optional health checks
//! - `install`: put the fleet agent on a new machine

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_core::config::{self, FleetConfig};
use fleet_core::error::ConfigError;
use fleetops::commands;
use fleetops::output::print_error;

#[derive(Parser)]
#[command(name = "fleetops")]
#[command(author, version, about = "Fleet command dispatch and interactive terminals")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command on selected hosts
    /// Alias: run
    #[command(alias = "run")]
    Exec {
        /// The shell command to run
        command: String,

        /// Target host (repeatable)
        #[arg(short = 'H', long = "host")]
        hosts: Vec<String>,

        /// Target every host in the inventory
        #[arg(short, long)]
        all: bool,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Open an interactive terminal session on a host
    Connect {
        /// Hostname to connect to
        host: String,
    },

    /// List the fleet inventory
    Hosts {
        /// Query the metrics API for each host's health
        #[arg(long)]
        health: bool,
    },

    /// Install the fleet agent on a new machine
    Install {
        /// Address of the machine
        ip: String,

        /// Remote user for the installer
        #[arg(short, long, default_value = "root")]
        user: String,

        /// Remote password handed to the installer
        #[arg(short, long)]
        password: String,

        /// Also record the machine in the inventory under this name
        #[arg(long)]
        hostname: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let config = load_or_default(&config_path)?;

    let result = match cli.command {
        Commands::Exec {
            command,
            hosts,
            all,
            json,
        } => commands::exec_command(&config, &command, &hosts, all, json).await,

        Commands::Connect { host } => commands::connect_command(&config, &host).await,

        Commands::Hosts { health } => commands::hosts_command(&config, health).await,

        Commands::Install {
            ip,
            user,
            password,
            hostname,
        } => {
            commands::install_command(
                &config,
                &config_path,
                &ip,
                &user,
                &password,
                hostname.as_deref(),
            )
            .await
        }
    };

    if let Err(e) = result {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Load the config file, falling back to defaults when it does not
/// exist yet
fn load_or_default(path: &std::path::Path) -> Result<FleetConfig> {
    match config::load_config(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(FleetConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}
