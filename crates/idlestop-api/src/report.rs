//! Evaluation report

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{BillingCycle, MachineIdleState, ShutdownDecision, Verdict};

/// One marker as judged during an evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerReport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// None when the marker's contents could not be parsed
    pub timeout_minutes: Option<u64>,
    /// None when the modification time is unknown
    pub elapsed_minutes: Option<u64>,
    pub verdict: Verdict,
    #[serde(default)]
    pub malformed: bool,
}

/// Why a machine was judged busy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusyReason {
    /// At least one marker has not timed out (malformed markers counted as busy included)
    ActiveMarkers { count: usize },
    /// No markers, and the empty directory policy says busy
    EmptyDirectory,
    /// Every marker timed out, or the last one was removed, too recently
    QuietPeriod { remaining_minutes: u64 },
}

/// Everything one evaluation looked at and decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluated_at: DateTime<Local>,
    pub uptime_minutes: u64,
    pub markers: Vec<MarkerReport>,
    pub idle_state: MachineIdleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_reason: Option<BusyReason>,
    pub billing: BillingCycle,
    pub threshold_minutes: u64,
    pub decision: ShutdownDecision,
    /// One-line human explanation of the decision
    pub reason: String,
}

impl EvaluationReport {
    pub fn busy_markers(&self) -> impl Iterator<Item = &MarkerReport> {
        self.markers.iter().filter(|m| m.verdict.is_busy())
    }

    pub fn should_shut_down(&self) -> bool {
        self.decision == ShutdownDecision::Shutdown
    }
}
