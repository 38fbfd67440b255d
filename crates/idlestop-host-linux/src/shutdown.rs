//! Shutdown through an external command

use idlestop_host_api::{HostError, HostResult, ShutdownExecutor};
use nix::unistd::geteuid;
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Runs a configured command to power the machine off.
///
/// The broadcast message is appended as the final argument, which matches
/// `shutdown -h now "<message>"`.
#[derive(Debug, Clone)]
pub struct CommandShutdown {
    argv: Vec<String>,
}

impl CommandShutdown {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl Default for CommandShutdown {
    fn default() -> Self {
        Self::new(vec!["/sbin/shutdown".into(), "-h".into(), "now".into()])
    }
}

impl ShutdownExecutor for CommandShutdown {
    fn shutdown(&self, message: &str) -> HostResult<()> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(HostError::ShutdownFailed("Empty shutdown command".into()));
        };

        if !geteuid().is_root() {
            warn!(program = %program, "Not running as root, shutdown will probably be refused");
        }

        info!(program = %program, args = ?args, message = %message, "Running shutdown command");

        let status = Command::new(program)
            .args(args)
            .arg(message)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| HostError::ShutdownFailed(format!("Failed to run {}: {}", program, e)))?;

        if status.success() {
            Ok(())
        } else if status.code() == Some(1) && !geteuid().is_root() {
            Err(HostError::PermissionDenied(format!("{} exited with {}", program, status)))
        } else {
            Err(HostError::ShutdownFailed(format!("{} exited with {}", program, status)))
        }
    }
}
