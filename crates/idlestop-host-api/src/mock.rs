//! Mock host adapter for testing

use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{Clock, HostError, HostResult, ShutdownExecutor, UptimeSource};

/// Mock host for unit/integration testing
///
/// Clock and uptime are whatever the test sets; shutdown requests are
/// recorded instead of executed.
pub struct MockHost {
    now: Arc<Mutex<DateTime<Local>>>,
    uptime: Arc<Mutex<Duration>>,
    shutdowns: Arc<Mutex<Vec<String>>>,

    /// Configure shutdown to fail
    pub fail_shutdown: Arc<Mutex<bool>>,

    /// Configure uptime to be unavailable
    pub fail_uptime: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new(now: DateTime<Local>, uptime: Duration) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            uptime: Arc::new(Mutex::new(uptime)),
            shutdowns: Arc::new(Mutex::new(Vec::new())),
            fail_shutdown: Arc::new(Mutex::new(false)),
            fail_uptime: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_uptime_minutes(now: DateTime<Local>, minutes: u64) -> Self {
        Self::new(now, Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Move both the clock and the uptime forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        *self.uptime.lock().unwrap() += by;
    }

    pub fn set_uptime(&self, uptime: Duration) {
        *self.uptime.lock().unwrap() = uptime;
    }

    /// Messages of every shutdown requested so far
    pub fn shutdown_requests(&self) -> Vec<String> {
        self.shutdowns.lock().unwrap().clone()
    }
}

impl Clock for MockHost {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

impl UptimeSource for MockHost {
    fn uptime(&self) -> HostResult<Duration> {
        if *self.fail_uptime.lock().unwrap() {
            return Err(HostError::UptimeUnavailable("Mock uptime failure".into()));
        }
        Ok(*self.uptime.lock().unwrap())
    }
}

impl ShutdownExecutor for MockHost {
    fn shutdown(&self, message: &str) -> HostResult<()> {
        if *self.fail_shutdown.lock().unwrap() {
            return Err(HostError::ShutdownFailed("Mock shutdown failure".into()));
        }
        self.shutdowns.lock().unwrap().push(message.to_string());
        Ok(())
    }
}
