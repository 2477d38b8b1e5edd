//! CLI command implementations

use anyhow::{Context, Result};
use deploykey_config::ProvisionConfig;
use deploykey_core::{ProcessEnv, Provisioner, SetupOutcome};
use std::path::Path;

/// Write the deploy key and SSH config
pub fn setup(provisioner: &Provisioner) -> Result<()> {
    let outcome = provisioner
        .setup(&ProcessEnv)
        .context("SSH setup failed")?;

    if let SetupOutcome::Provisioned { hosts, .. } = outcome {
        tracing::info!(
            "SSH config for {} host(s) written to {}",
            hosts,
            provisioner.paths().dir.display()
        );
    }

    Ok(())
}

/// Remove the deploy key and SSH config. Never fails.
pub fn cleanup(provisioner: &Provisioner) {
    provisioner.cleanup(&mut ProcessEnv);
}

/// Set up, run `cmd` with inherited stdio, clean up, and return its exit code
pub async fn exec(provisioner: &Provisioner, cmd: &[String]) -> Result<i32> {
    let (program, args) = cmd.split_first().context("No command specified")?;

    // Installed before anything is written: once the key is on disk a
    // cancelled job must still reach cleanup instead of dying on the signal
    let mut signals = Signals::new().context("Failed to install signal handlers")?;

    let mut env = ProcessEnv;
    let guard = provisioner.guard(&mut env).context("SSH setup failed")?;

    // The key is on disk now; the command doesn't need the encoded copy
    let spawned = tokio::process::Command::new(program)
        .args(args)
        .env_remove(provisioner.env_name())
        .spawn();

    let status = match spawned {
        Ok(mut child) => wait_for_child(&mut child, &mut signals, program).await,
        Err(e) => Err(e),
    };

    guard.finish();

    let status = status.with_context(|| format!("Failed to run '{}'", program))?;
    Ok(exit_code(status))
}

/// Signals that would otherwise terminate us while the command runs
#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }
}

/// Wait for `child`, passing SIGTERM and SIGHUP on to it
#[cfg(unix)]
async fn wait_for_child(
    child: &mut tokio::process::Child,
    signals: &mut Signals,
    program: &str,
) -> std::io::Result<std::process::ExitStatus> {
    use nix::sys::signal::Signal;

    loop {
        tokio::select! {
            status = child.wait() => return status,
            Some(()) = signals.interrupt.recv() => {
                // The terminal delivers ^C to the child as well
                tracing::debug!("Interrupted, waiting for {} to exit", program);
            }
            Some(()) = signals.terminate.recv() => forward_signal(child, Signal::SIGTERM, program),
            Some(()) = signals.hangup.recv() => forward_signal(child, Signal::SIGHUP, program),
        }
    }
}

#[cfg(unix)]
fn forward_signal(child: &tokio::process::Child, signal: nix::sys::signal::Signal, program: &str) {
    use nix::unistd::Pid;

    // None once the child has been reaped
    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };

    tracing::info!("Received {}, stopping {}", signal.as_str(), program);
    if let Err(e) = nix::sys::signal::kill(Pid::from_raw(pid), signal) {
        tracing::warn!("Could not send {} to {}: {}", signal.as_str(), program, e);
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
async fn wait_for_child(
    child: &mut tokio::process::Child,
    _signals: &mut Signals,
    program: &str,
) -> std::io::Result<std::process::ExitStatus> {
    loop {
        tokio::select! {
            status = child.wait() => return status,
            interrupt = tokio::signal::ctrl_c() => {
                if let Err(e) = interrupt {
                    tracing::debug!("Cannot listen for interrupts: {}", e);
                    return child.wait().await;
                }
                tracing::debug!("Interrupted, waiting for {} to exit", program);
            }
        }
    }
}

/// Print the trigger variable and file state
pub fn status(provisioner: &Provisioner) {
    let status = provisioner.status(&ProcessEnv);
    let paths = provisioner.paths();
    let present = |yes: bool| if yes { "present" } else { "absent" };

    println!(
        "Key variable:  ${} ({})",
        provisioner.env_name(),
        if status.trigger_present { "set" } else { "not set" }
    );
    println!("SSH directory: {}", paths.dir.display());
    println!(
        "Key file:      {} ({})",
        paths.key_file.display(),
        present(status.key_file_exists)
    );
    println!(
        "Config file:   {} ({})",
        paths.config_file.display(),
        present(status.config_file_exists)
    );
    println!("Hosts:         {}", provisioner.hosts().join(", "));
}

/// Show or edit the config file at `config_path`
pub fn config(config_path: &Path, edit: bool) -> Result<()> {
    if edit {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

        // Create config file with defaults if it doesn't exist
        if !config_path.exists() {
            ProvisionConfig::default().save_to(config_path)?;
            println!("Created default config at {:?}", config_path);
        }

        std::process::Command::new(&editor)
            .arg(config_path)
            .status()
            .context(format!("Failed to open editor: {}", editor))?;
    } else if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {:?}", config_path))?;
        println!("# Config file: {:?}\n", config_path);
        println!("{}", content);
    } else {
        println!("# Config file: {:?} (not created yet)\n", config_path);
        println!("# Default configuration:");
        let content = toml::to_string_pretty(&ProvisionConfig::default())?;
        println!("{}", content);
        println!("\n# Run 'deploykey config --edit' to create and edit the config file.");
    }

    Ok(())
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
