//! Uptime from procfs

use idlestop_host_api::{HostError, HostResult, UptimeSource};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const PROC_UPTIME: &str = "/proc/uptime";

/// Reads seconds since boot from `/proc/uptime`
#[derive(Debug, Clone)]
pub struct ProcUptime {
    path: PathBuf,
}

impl ProcUptime {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(PROC_UPTIME),
        }
    }

    /// Read from another file with the same format (tests, containers)
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcUptime {
    fn default() -> Self {
        Self::new()
    }
}

impl UptimeSource for ProcUptime {
    fn uptime(&self) -> HostResult<Duration> {
        let content = std::fs::read_to_string(&self.path)?;
        let uptime = parse_proc_uptime(&content)?;
        debug!(path = %self.path.display(), uptime_secs = uptime.as_secs(), "Read uptime");
        Ok(uptime)
    }
}

/// Parse the first field of `/proc/uptime` ("12345.67 54321.00")
pub fn parse_proc_uptime(content: &str) -> HostResult<Duration> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| HostError::UptimeUnavailable("empty uptime file".into()))?;

    let secs: f64 = first
        .parse()
        .map_err(|_| HostError::UptimeUnavailable(format!("unparseable uptime '{}'", first)))?;

    Duration::try_from_secs_f64(secs)
        .map_err(|_| HostError::UptimeUnavailable(format!("invalid uptime '{}'", first)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_typical_line() {
        let uptime = parse_proc_uptime("3480.52 13766.31\n").unwrap();
        assert_eq!(uptime.as_secs(), 3480);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_proc_uptime("").is_err());
        assert!(parse_proc_uptime("abc 12").is_err());
        assert!(parse_proc_uptime("-5.0 1.0").is_err());
    }

    #[test]
    fn read_from_custom_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "7200.00 100.00").unwrap();

        let source = ProcUptime::with_path(file.path());
        assert_eq!(source.uptime().unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = ProcUptime::with_path("/nonexistent/uptime");
        assert!(matches!(source.uptime(), Err(HostError::Io(_))));
    }
}
