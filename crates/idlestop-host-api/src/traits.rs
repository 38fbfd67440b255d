//! Host adapter traits

use chrono::{DateTime, Local};
use idlestop_util::IdlestopError;
use std::time::Duration;
use thiserror::Error;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Uptime unavailable: {0}")]
    UptimeUnavailable(String),

    #[error("Shutdown failed: {0}")]
    ShutdownFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

impl From<HostError> for IdlestopError {
    fn from(err: HostError) -> Self {
        IdlestopError::host(err.to_string())
    }
}

/// Source of the current wall-clock time
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// How long the machine has been up
pub trait UptimeSource {
    fn uptime(&self) -> HostResult<Duration>;
}

/// Carries out a shutdown the evaluator decided on
pub trait ShutdownExecutor {
    /// Request an OS shutdown. `message` is broadcast to logged-in users
    /// where the platform supports it.
    fn shutdown(&self, message: &str) -> HostResult<()>;
}

/// Clock backed by [`idlestop_util::now`], so debug mock time applies
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        idlestop_util::now()
    }
}

/// Uptime fixed by the caller, e.g. from `--uptime-minutes`
#[derive(Debug, Clone, Copy)]
pub struct FixedUptime(pub Duration);

impl FixedUptime {
    pub fn from_minutes(minutes: u64) -> Self {
        Self(Duration::from_secs(minutes.saturating_mul(60)))
    }
}

impl UptimeSource for FixedUptime {
    fn uptime(&self) -> HostResult<Duration> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_uptime_from_minutes() {
        let uptime = FixedUptime::from_minutes(58).uptime().unwrap();
        assert_eq!(uptime, Duration::from_secs(58 * 60));
    }

    #[test]
    fn fixed_uptime_saturates_on_huge_values() {
        let uptime = FixedUptime::from_minutes(u64::MAX).uptime().unwrap();
        assert_eq!(uptime, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn host_error_converts_to_core_error() {
        let err: IdlestopError = HostError::ShutdownFailed("exit status 1".into()).into();
        assert!(matches!(err, IdlestopError::HostError(msg) if msg.contains("exit status 1")));
    }
}
