//! Machine-level idleness

use chrono::{DateTime, Local};
use idlestop_api::{EmptyDirPolicy, MachineIdleState, Marker, Verdict};

use idlestop_util::whole_minutes_between;

use crate::elapsed_minutes;

/// Reduce per-marker verdicts to one machine state.
///
/// Any busy verdict makes the machine busy. With no verdicts at all the
/// configured `empty_dir` policy decides.
pub fn aggregate(verdicts: &[Verdict], empty_dir: EmptyDirPolicy) -> MachineIdleState {
    if verdicts.is_empty() {
        return empty_dir.idle_state();
    }

    if verdicts.iter().any(|v| v.is_busy()) {
        MachineIdleState::Busy
    } else {
        MachineIdleState::Idle
    }
}

/// Minutes left in the idle quiet period, or `None` once it is over.
///
/// Only meaningful when every marker has timed out: the machine is held busy
/// until each of them has been timed out for `quiet_minutes`. Jobs that
/// finish delete their marker, so the last change to the marker directory
/// (`dir_modified`) counts as activity too. A zero quiet period means no wait.
pub fn quiet_period_remaining(
    markers: &[Marker],
    dir_modified: Option<DateTime<Local>>,
    now: DateTime<Local>,
    quiet_minutes: u64,
) -> Option<u64> {
    if quiet_minutes == 0 {
        return None;
    }

    let since_timeouts = markers
        .iter()
        .map(|m| elapsed_minutes(m, now).saturating_sub(m.timeout_minutes));
    let since_dir_change = dir_modified.map(|t| whole_minutes_between(t, now));

    since_timeouts
        .chain(since_dir_change)
        .map(|quiet_for| quiet_minutes.saturating_sub(quiet_for))
        .filter(|&remaining| remaining > 0)
        .max()
}
