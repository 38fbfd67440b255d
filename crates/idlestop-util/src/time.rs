//! Time utilities for idlestop
//!
//! The core never reads the clock itself; callers obtain "now" here (or from
//! a host `Clock`) and pass it in. All idleness and billing arithmetic is done
//! in whole minutes, rounded down.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `IDLESTOP_MOCK_TIME` environment variable can be set
//! to override the system time returned by [`now`]. Useful for checking how
//! a marker directory will be judged some minutes from now.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! IDLESTOP_MOCK_TIME="2025-12-25 14:30:00" idlestop check
//! ```

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "IDLESTOP_MOCK_TIME";

/// Format accepted in `IDLESTOP_MOCK_TIME`
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, captured on first use so that
/// mock time keeps advancing.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match parse_mock_time(&mock_time_str) {
                    Some(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(chrono::Local::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time, using the system clock"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Parse a mock time string in the local timezone.
pub fn parse_mock_time(s: &str) -> Option<DateTime<Local>> {
    let naive_dt = NaiveDateTime::parse_from_str(s, MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive_dt).single()
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Whole minutes from `earlier` to `later`, rounded down.
///
/// A marker touched 4m59s ago has been idle for 4 minutes. If `earlier` lies
/// in the future (clock skew, a file touched by another host), the result is 0.
pub fn whole_minutes_between(earlier: DateTime<Local>, later: DateTime<Local>) -> u64 {
    let elapsed = later.signed_duration_since(earlier);
    if elapsed <= chrono::Duration::zero() {
        return 0;
    }
    elapsed.num_minutes() as u64
}

/// Whole minutes in a duration, rounded down.
pub fn whole_minutes(d: Duration) -> u64 {
    d.as_secs() / 60
}

/// Format a DateTime with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a minute count in human-readable form
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, rest)
    } else {
        format!("{}m", rest)
    }
}
