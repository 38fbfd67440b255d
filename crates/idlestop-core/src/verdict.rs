//! Per-marker verdicts

use chrono::{DateTime, Local};
use idlestop_api::{Marker, Verdict};
use idlestop_util::whole_minutes_between;

/// Whole minutes since the marker was last touched, rounded down.
pub fn elapsed_minutes(marker: &Marker, now: DateTime<Local>) -> u64 {
    whole_minutes_between(marker.last_modified, now)
}

/// Busy while fewer whole minutes than the timeout have passed.
///
/// A zero timeout is timed out immediately.
pub fn classify(marker: &Marker, now: DateTime<Local>) -> Verdict {
    classify_elapsed(elapsed_minutes(marker, now), marker.timeout_minutes)
}

pub fn classify_elapsed(elapsed_minutes: u64, timeout_minutes: u64) -> Verdict {
    if elapsed_minutes < timeout_minutes {
        Verdict::Busy
    } else {
        Verdict::TimedOut
    }
}
