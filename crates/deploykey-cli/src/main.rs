//! deploykey - temporary SSH deploy keys for CI jobs

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use deploykey_config::{ConfigError, ProvisionConfig};
use deploykey_core::Provisioner;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "deploykey")]
#[command(author, version, about = "Temporary SSH deploy keys for CI jobs", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.config/deploykey/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Environment variable holding the base64-encoded private key
    #[arg(long, global = true, value_name = "NAME")]
    env: Option<String>,

    /// Host to generate an SSH stanza for (repeatable, replaces configured hosts)
    #[arg(long = "host", global = true, value_name = "HOST")]
    hosts: Vec<String>,

    /// Directory for the key and SSH config (default: ~/.ssh)
    #[arg(long, global = true, value_name = "DIR")]
    ssh_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the deploy key and SSH config if the key variable is set
    Setup,

    /// Remove the deploy key and SSH config if the key variable is set
    Cleanup,

    /// Set up, run a command, and clean up afterwards
    Exec {
        /// Command to run
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        cmd: Vec<String>,
    },

    /// Show whether the key variable and generated files are present
    Status,

    /// Show or edit the configuration file
    Config {
        /// Open config in editor
        #[arg(short, long)]
        edit: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    // Logs go to stderr so the output of `exec` stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => match ProvisionConfig::config_path() {
            Ok(path) => path,
            Err(ConfigError::NoConfigDir) => {
                tracing::debug!("No config directory, using defaults");
                return dispatch(cli, None, ProvisionConfig::default()).await;
            }
            Err(e) => return Err(e.into()),
        },
    };

    let config = ProvisionConfig::load_from(&config_path)?;
    dispatch(cli, Some(config_path), config).await
}

async fn dispatch(
    cli: Cli,
    config_path: Option<PathBuf>,
    mut config: ProvisionConfig,
) -> anyhow::Result<i32> {
    if let Some(env) = cli.env {
        config.env = env;
    }
    if !cli.hosts.is_empty() {
        config.hosts = cli.hosts;
    }
    if let Some(dir) = cli.ssh_dir {
        config.ssh_dir = Some(dir);
    }

    match cli.command {
        Commands::Setup => commands::setup(&Provisioner::new(&config)?)?,
        Commands::Cleanup => commands::cleanup(&Provisioner::for_cleanup(&config)?),
        Commands::Exec { cmd } => return commands::exec(&Provisioner::new(&config)?, &cmd).await,
        Commands::Status => commands::status(&Provisioner::new(&config)?),
        Commands::Config { edit } => {
            // Works on the file, not the effective settings
            let path = config_path.context("Cannot determine config file location")?;
            commands::config(&path, edit)?;
        }
    }

    Ok(0)
}
