//! Read-evaluate-act cycle

use idlestop_api::{EvaluationReport, ShutdownDecision};
use idlestop_core::{IdlenessEvaluator, MarkerSource};
use idlestop_host_api::{Clock, ShutdownExecutor, UptimeSource};
use idlestop_util::{IdlestopResult, whole_minutes};
use serde::Serialize;
use tracing::{error, info, warn};

/// What the caller wants done with the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report only
    Check,
    /// Report, and shut down if the decision says so
    Run,
}

/// What actually happened after the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    KeptAlive,
    /// Shutdown decided but not executed: check mode or dry run
    ShutdownSkipped,
    ShutdownRequested,
}

/// The evaluation and what was done about it
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    #[serde(flatten)]
    pub report: EvaluationReport,
    pub outcome: Outcome,
}

/// Host collaborators plus the evaluator
pub struct Runner<'a> {
    pub evaluator: &'a IdlenessEvaluator,
    pub markers: &'a dyn MarkerSource,
    pub clock: &'a dyn Clock,
    pub uptime: &'a dyn UptimeSource,
    pub shutdown: &'a dyn ShutdownExecutor,
    pub shutdown_message: &'a str,
    pub dry_run: bool,
}

impl Runner<'_> {
    /// Evaluate once and act according to `mode`.
    ///
    /// Any error, including a failed uptime read, ends the run before a
    /// decision is made, so the machine stays up.
    pub fn run_once(&self, mode: Mode) -> IdlestopResult<RunResult> {
        let now = self.clock.now();
        let uptime_minutes = whole_minutes(self.uptime.uptime()?);

        let report = self.evaluator.evaluate(self.markers, now, uptime_minutes)?;

        let outcome = match report.decision {
            ShutdownDecision::KeepAlive => {
                info!(reason = %report.reason, "Keeping machine alive");
                Outcome::KeptAlive
            }
            ShutdownDecision::Shutdown if mode == Mode::Check => {
                info!(reason = %report.reason, "Shutdown would save money (check only)");
                Outcome::ShutdownSkipped
            }
            ShutdownDecision::Shutdown if self.dry_run => {
                warn!(reason = %report.reason, "Dry run: not shutting down");
                Outcome::ShutdownSkipped
            }
            ShutdownDecision::Shutdown => {
                error!(reason = %report.reason, "Money-saving idle period reached. Shutting down.");
                self.shutdown.shutdown(self.shutdown_message)?;
                Outcome::ShutdownRequested
            }
        };

        Ok(RunResult { report, outcome })
    }
}
