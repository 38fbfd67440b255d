//! Shared types for idlestop

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One job's idle-timeout declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Filename without the marker extension
    pub name: String,
    /// Minutes of inactivity after which the job no longer keeps the machine up
    pub timeout_minutes: u64,
    /// Last activity, taken from the file's modification time
    pub last_modified: DateTime<Local>,
    /// Where the marker was read from, if it came from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Marker {
    pub fn new(name: impl Into<String>, timeout_minutes: u64, last_modified: DateTime<Local>) -> Self {
        Self {
            name: name.into(),
            timeout_minutes,
            last_modified,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A marker file whose contents are not a non-negative integer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedMarker {
    pub name: String,
    pub path: PathBuf,
    /// Raw contents (lossy UTF-8), for the operator
    pub contents: String,
    pub last_modified: Option<DateTime<Local>>,
}

/// Per-marker verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Touched more recently than its timeout
    Busy,
    /// Untouched for at least its timeout
    TimedOut,
}

impl Verdict {
    pub fn is_busy(self) -> bool {
        matches!(self, Verdict::Busy)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Busy => write!(f, "busy"),
            Verdict::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Aggregate idleness of the whole machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineIdleState {
    Busy,
    Idle,
}

impl fmt::Display for MachineIdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineIdleState::Busy => write!(f, "busy"),
            MachineIdleState::Idle => write!(f, "idle"),
        }
    }
}

/// The final output of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownDecision {
    Shutdown,
    KeepAlive,
}

impl fmt::Display for ShutdownDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownDecision::Shutdown => write!(f, "shutdown"),
            ShutdownDecision::KeepAlive => write!(f, "keep alive"),
        }
    }
}

/// How to judge a marker directory that contains no markers at all
///
/// `Idle` shuts down machines that never ran a job; `Busy` keeps a machine
/// up until its first job has written a marker and timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDirPolicy {
    #[default]
    Idle,
    Busy,
}

impl EmptyDirPolicy {
    pub fn idle_state(self) -> MachineIdleState {
        match self {
            EmptyDirPolicy::Idle => MachineIdleState::Idle,
            EmptyDirPolicy::Busy => MachineIdleState::Busy,
        }
    }
}

/// What to do when a marker's contents cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedMarkerPolicy {
    /// Abort the evaluation with an error naming the file
    #[default]
    Fail,
    /// Count the marker as a busy job
    #[serde(alias = "busy")]
    TreatAsBusy,
}

/// Position of the machine within its current paid time block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCycle {
    /// Length of the current block; the boot block while still inside it
    pub cycle_length_minutes: u64,
    /// Minutes already used of the current block
    pub elapsed_minutes: u64,
    /// True while the machine is still inside the block paid for at boot
    #[serde(default)]
    pub in_boot_block: bool,
}

impl BillingCycle {
    pub fn remaining_minutes(&self) -> u64 {
        self.cycle_length_minutes.saturating_sub(self.elapsed_minutes)
    }
}
