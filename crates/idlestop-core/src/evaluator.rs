//! The idleness evaluator

use chrono::{DateTime, Local};
use idlestop_api::{
    BillingCycle, BusyReason, EmptyDirPolicy, EvaluationReport, MachineIdleState,
    MalformedMarkerPolicy, MarkerReport, ShutdownDecision, Verdict,
};
use idlestop_config::Policy;
use idlestop_util::{IdlestopError, IdlestopResult, format_minutes, whole_minutes_between};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::{
    BillingSettings, DirMarkerSource, MarkerSource, aggregate, billing_cycle, classify_elapsed,
    elapsed_minutes, quiet_period_remaining, shutdown_decision,
};

/// Everything the evaluator needs besides markers, time and uptime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorSettings {
    pub empty_dir: EmptyDirPolicy,
    pub malformed: MalformedMarkerPolicy,
    /// 0 disables the quiet period
    pub idle_quiet_minutes: u64,
    pub billing: BillingSettings,
}

impl EvaluatorSettings {
    pub fn new(billing: BillingSettings) -> Self {
        Self {
            empty_dir: EmptyDirPolicy::default(),
            malformed: MalformedMarkerPolicy::default(),
            idle_quiet_minutes: 0,
            billing,
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            empty_dir: policy.markers.empty_dir,
            malformed: policy.markers.malformed,
            idle_quiet_minutes: policy.markers.idle_quiet_minutes,
            billing: BillingSettings::from_policy(&policy.billing),
        }
    }
}

/// Flat invocation surface for callers that do not use a config file
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub marker_dir: PathBuf,
    pub marker_extension: String,
    pub empty_dir_policy: EmptyDirPolicy,
    pub cycle_length_minutes: u64,
    pub threshold_minutes: u64,
    pub current_uptime_minutes: u64,
}

/// Scans markers and decides whether the machine should shut down.
///
/// Holds no state between calls: every evaluation reads the markers afresh.
#[derive(Debug, Clone)]
pub struct IdlenessEvaluator {
    settings: EvaluatorSettings,
}

impl IdlenessEvaluator {
    pub fn new(settings: EvaluatorSettings) -> IdlestopResult<Self> {
        settings.billing.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &EvaluatorSettings {
        &self.settings
    }

    /// Evaluate the markers of `source` at `now`, for a machine that has been
    /// up for `uptime_minutes`.
    pub fn evaluate(
        &self,
        source: &dyn MarkerSource,
        now: DateTime<Local>,
        uptime_minutes: u64,
    ) -> IdlestopResult<EvaluationReport> {
        let scan = source.scan()?;

        if self.settings.malformed == MalformedMarkerPolicy::Fail
            && let Some(bad) = scan.malformed.first()
        {
            warn!(
                name = %bad.name,
                path = %bad.path.display(),
                contents = ?bad.contents,
                "Malformed marker, aborting evaluation"
            );
            return Err(IdlestopError::malformed(
                bad.name.clone(),
                bad.path.clone(),
                bad.contents.clone(),
            ));
        }

        let mut rows = Vec::with_capacity(scan.len());

        for marker in &scan.markers {
            let elapsed = elapsed_minutes(marker, now);
            let verdict = classify_elapsed(elapsed, marker.timeout_minutes);

            match verdict {
                Verdict::Busy => info!(
                    name = %marker.name,
                    elapsed_minutes = elapsed,
                    timeout_minutes = marker.timeout_minutes,
                    "Job still active"
                ),
                Verdict::TimedOut => info!(
                    name = %marker.name,
                    elapsed_minutes = elapsed,
                    timeout_minutes = marker.timeout_minutes,
                    "Job timed out"
                ),
            }

            rows.push(MarkerReport {
                name: marker.name.clone(),
                path: marker.path.clone(),
                timeout_minutes: Some(marker.timeout_minutes),
                elapsed_minutes: Some(elapsed),
                verdict,
                malformed: false,
            });
        }

        for bad in &scan.malformed {
            warn!(
                name = %bad.name,
                path = %bad.path.display(),
                contents = ?bad.contents,
                "Malformed marker, counting it as busy"
            );
            rows.push(MarkerReport {
                name: bad.name.clone(),
                path: Some(bad.path.clone()),
                timeout_minutes: None,
                elapsed_minutes: bad.last_modified.map(|t| whole_minutes_between(t, now)),
                verdict: Verdict::Busy,
                malformed: true,
            });
        }

        rows.sort_by(|a, b| a.name.cmp(&b.name));

        let verdicts: Vec<Verdict> = rows.iter().map(|r| r.verdict).collect();
        let mut idle_state = aggregate(&verdicts, self.settings.empty_dir);
        let mut busy_reason = match idle_state {
            MachineIdleState::Busy if verdicts.is_empty() => Some(BusyReason::EmptyDirectory),
            MachineIdleState::Busy => Some(BusyReason::ActiveMarkers {
                count: verdicts.iter().filter(|v| v.is_busy()).count(),
            }),
            MachineIdleState::Idle => None,
        };

        if idle_state == MachineIdleState::Idle
            && let Some(remaining) =
                quiet_period_remaining(
                    &scan.markers,
                    scan.dir_modified,
                    now,
                    self.settings.idle_quiet_minutes,
                )
        {
            debug!(remaining_minutes = remaining, "All jobs done, in the quiet period");
            idle_state = MachineIdleState::Busy;
            busy_reason = Some(BusyReason::QuietPeriod {
                remaining_minutes: remaining,
            });
        }

        let billing = billing_cycle(uptime_minutes, &self.settings.billing);
        let threshold_minutes = self.settings.billing.threshold_minutes;
        let decision = shutdown_decision(idle_state, &billing, threshold_minutes);
        let reason = describe(busy_reason, &billing, threshold_minutes, decision);

        info!(
            markers = rows.len(),
            idle_state = %idle_state,
            uptime_minutes,
            remaining_minutes = billing.remaining_minutes(),
            threshold_minutes,
            decision = %decision,
            reason = %reason,
            "Evaluation complete"
        );

        Ok(EvaluationReport {
            evaluated_at: now,
            uptime_minutes,
            markers: rows,
            idle_state,
            busy_reason,
            billing,
            threshold_minutes,
            decision,
            reason,
        })
    }

    /// Like [`evaluate`](Self::evaluate), returning only the decision
    pub fn decide(
        &self,
        source: &dyn MarkerSource,
        now: DateTime<Local>,
        uptime_minutes: u64,
    ) -> IdlestopResult<ShutdownDecision> {
        self.evaluate(source, now, uptime_minutes)
            .map(|report| report.decision)
    }
}

/// One-shot evaluation of a marker directory with default policies for
/// everything the request does not name.
pub fn evaluate_request(
    request: &EvaluationRequest,
    now: DateTime<Local>,
) -> IdlestopResult<ShutdownDecision> {
    let mut settings = EvaluatorSettings::new(BillingSettings::new(
        request.cycle_length_minutes,
        request.threshold_minutes,
    ));
    settings.empty_dir = request.empty_dir_policy;

    let evaluator = IdlenessEvaluator::new(settings)?;
    let source = DirMarkerSource::new(&request.marker_dir, &request.marker_extension)?;
    evaluator.decide(&source, now, request.current_uptime_minutes)
}

fn describe(
    busy_reason: Option<BusyReason>,
    billing: &BillingCycle,
    threshold_minutes: u64,
    decision: ShutdownDecision,
) -> String {
    let remaining = billing.remaining_minutes();
    let block = if billing.in_boot_block {
        "boot block"
    } else {
        "billing cycle"
    };

    match (busy_reason, decision) {
        (Some(BusyReason::ActiveMarkers { count: 1 }), _) => "1 job still active".to_string(),
        (Some(BusyReason::ActiveMarkers { count }), _) => format!("{} jobs still active", count),
        (Some(BusyReason::EmptyDirectory), _) => {
            "no markers, and an empty marker directory counts as busy".to_string()
        }
        (Some(BusyReason::QuietPeriod { remaining_minutes }), _) => format!(
            "all jobs done, quiet period ends in {}",
            format_minutes(remaining_minutes)
        ),
        (None, ShutdownDecision::Shutdown) => format!(
            "idle with {} left in the {}, below the {} threshold",
            format_minutes(remaining),
            block,
            format_minutes(threshold_minutes)
        ),
        (None, ShutdownDecision::KeepAlive) => format!(
            "idle, but {} already paid for in the current {}",
            format_minutes(remaining),
            block
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryMarkerSource;
    use chrono::TimeZone;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, 25, 10, 0, 0).unwrap()
    }

    fn minutes_ago(m: i64) -> DateTime<Local> {
        now() - chrono::Duration::minutes(m)
    }

    fn evaluator() -> IdlenessEvaluator {
        IdlenessEvaluator::new(EvaluatorSettings::new(BillingSettings::new(60, 5))).unwrap()
    }

    fn evaluator_with(f: impl FnOnce(&mut EvaluatorSettings)) -> IdlenessEvaluator {
        let mut settings = EvaluatorSettings::new(BillingSettings::new(60, 5));
        f(&mut settings);
        IdlenessEvaluator::new(settings).unwrap()
    }

    #[test]
    fn test_recent_marker_keeps_alive() {
        let source = MemoryMarkerSource::new().with_marker("build123", 5, minutes_ago(3));

        let report = evaluator().evaluate(&source, now(), 58).unwrap();

        assert_eq!(report.markers[0].verdict, Verdict::Busy);
        assert_eq!(report.idle_state, MachineIdleState::Busy);
        assert_eq!(report.busy_reason, Some(BusyReason::ActiveMarkers { count: 1 }));
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);
    }

    #[test]
    fn test_timed_out_near_cycle_end_shuts_down() {
        let source = MemoryMarkerSource::new().with_marker("build123", 5, minutes_ago(7));

        let report = evaluator().evaluate(&source, now(), 58).unwrap();

        assert_eq!(report.markers[0].verdict, Verdict::TimedOut);
        assert_eq!(report.markers[0].elapsed_minutes, Some(7));
        assert_eq!(report.idle_state, MachineIdleState::Idle);
        assert_eq!(report.billing.remaining_minutes(), 2);
        assert_eq!(report.decision, ShutdownDecision::Shutdown);
        assert!(report.should_shut_down());
    }

    #[test]
    fn test_timed_out_early_in_cycle_keeps_alive() {
        let source = MemoryMarkerSource::new().with_marker("build123", 5, minutes_ago(7));

        let report = evaluator().evaluate(&source, now(), 10).unwrap();

        assert_eq!(report.idle_state, MachineIdleState::Idle);
        assert_eq!(report.billing.remaining_minutes(), 50);
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);
        assert!(report.busy_reason.is_none());
    }

    #[test]
    fn test_one_busy_marker_among_many() {
        let source = MemoryMarkerSource::new()
            .with_marker("a", 5, minutes_ago(30))
            .with_marker("b", 5, minutes_ago(40))
            .with_marker("c", 60, minutes_ago(1));

        let report = evaluator().evaluate(&source, now(), 59).unwrap();
        assert_eq!(report.idle_state, MachineIdleState::Busy);
        assert_eq!(report.busy_markers().count(), 1);
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);
    }

    #[test]
    fn test_empty_directory_policy() {
        let source = MemoryMarkerSource::new();

        let idle = evaluator_with(|s| s.empty_dir = EmptyDirPolicy::Idle);
        let report = idle.evaluate(&source, now(), 58).unwrap();
        assert_eq!(report.idle_state, MachineIdleState::Idle);
        assert_eq!(report.decision, ShutdownDecision::Shutdown);

        let busy = evaluator_with(|s| s.empty_dir = EmptyDirPolicy::Busy);
        let report = busy.evaluate(&source, now(), 58).unwrap();
        assert_eq!(report.idle_state, MachineIdleState::Busy);
        assert_eq!(report.busy_reason, Some(BusyReason::EmptyDirectory));
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);
    }

    #[test]
    fn test_malformed_marker_fails_evaluation() {
        let source = MemoryMarkerSource::new()
            .with_marker("good", 5, minutes_ago(30))
            .with_malformed("build123", "abc");

        let result = evaluator().decide(&source, now(), 58);
        assert!(matches!(
            result,
            Err(IdlestopError::MalformedMarker { name, contents, .. })
                if name == "build123" && contents == "abc"
        ));
    }

    #[test]
    fn test_malformed_marker_treated_as_busy() {
        let source = MemoryMarkerSource::new()
            .with_marker("good", 5, minutes_ago(30))
            .with_malformed("build123", "abc");

        let evaluator = evaluator_with(|s| s.malformed = MalformedMarkerPolicy::TreatAsBusy);
        let report = evaluator.evaluate(&source, now(), 58).unwrap();

        let bad = report.markers.iter().find(|m| m.name == "build123").unwrap();
        assert!(bad.malformed);
        assert_eq!(bad.verdict, Verdict::Busy);
        assert_eq!(bad.timeout_minutes, None);
        assert_eq!(report.idle_state, MachineIdleState::Busy);
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);
    }

    #[test]
    fn test_quiet_period_holds_machine() {
        let source = MemoryMarkerSource::new().with_marker("job", 5, minutes_ago(6));
        let evaluator = evaluator_with(|s| s.idle_quiet_minutes = 2);

        let report = evaluator.evaluate(&source, now(), 58).unwrap();
        assert_eq!(report.idle_state, MachineIdleState::Busy);
        assert_eq!(
            report.busy_reason,
            Some(BusyReason::QuietPeriod { remaining_minutes: 1 })
        );
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);

        let later = now() + chrono::Duration::minutes(1);
        let report = evaluator.evaluate(&source, later, 59).unwrap();
        assert_eq!(report.idle_state, MachineIdleState::Idle);
        assert_eq!(report.decision, ShutdownDecision::Shutdown);
    }

    #[test]
    fn test_quiet_period_after_last_marker_removed() {
        // the last job deleted its marker a minute ago
        let source = MemoryMarkerSource::new().with_dir_modified(minutes_ago(1));
        let evaluator = evaluator_with(|s| s.idle_quiet_minutes = 2);

        let report = evaluator.evaluate(&source, now(), 58).unwrap();
        assert_eq!(
            report.busy_reason,
            Some(BusyReason::QuietPeriod { remaining_minutes: 1 })
        );
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);

        let later = now() + chrono::Duration::minutes(1);
        let report = evaluator.evaluate(&source, later, 59).unwrap();
        assert_eq!(report.idle_state, MachineIdleState::Idle);
        assert_eq!(report.decision, ShutdownDecision::Shutdown);
    }

    #[test]
    fn test_quiet_period_with_deleted_marker_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.log");
        std::fs::write(&path, "5").unwrap();
        std::fs::remove_file(&path).unwrap();

        let source = DirMarkerSource::new(dir.path(), "log").unwrap();
        let evaluator = evaluator_with(|s| s.idle_quiet_minutes = 2);

        let report = evaluator.evaluate(&source, Local::now(), 58).unwrap();
        assert!(matches!(
            report.busy_reason,
            Some(BusyReason::QuietPeriod { .. })
        ));
        assert_eq!(report.decision, ShutdownDecision::KeepAlive);
    }

    #[test]
    fn test_report_rows_are_sorted() {
        let source = MemoryMarkerSource::new()
            .with_marker("c", 5, minutes_ago(30))
            .with_malformed("b", "x")
            .with_marker("a", 5, minutes_ago(30));

        let evaluator = evaluator_with(|s| s.malformed = MalformedMarkerPolicy::TreatAsBusy);
        let report = evaluator.evaluate(&source, now(), 10).unwrap();
        let names: Vec<_> = report.markers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_cycle_length_rejected() {
        let result = IdlenessEvaluator::new(EvaluatorSettings::new(BillingSettings::new(0, 5)));
        assert!(matches!(result, Err(IdlestopError::ConfigError(_))));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let source = MemoryMarkerSource::new().with_marker("job", 5, minutes_ago(7));
        let evaluator = evaluator();

        let first = evaluator.evaluate(&source, now(), 58).unwrap();
        let second = evaluator.evaluate(&source, now(), 58).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_evaluate_request_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build123.log");
        std::fs::write(&path, "5\n").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(7 * 60))
            .unwrap();

        let mut request = EvaluationRequest {
            marker_dir: dir.path().to_path_buf(),
            marker_extension: "log".into(),
            empty_dir_policy: EmptyDirPolicy::Idle,
            cycle_length_minutes: 60,
            threshold_minutes: 5,
            current_uptime_minutes: 58,
        };

        let decision = evaluate_request(&request, Local::now()).unwrap();
        assert_eq!(decision, ShutdownDecision::Shutdown);

        request.current_uptime_minutes = 10;
        let decision = evaluate_request(&request, Local::now()).unwrap();
        assert_eq!(decision, ShutdownDecision::KeepAlive);
    }

    #[test]
    fn test_evaluate_request_rejects_multi_part_extension() {
        let dir = tempfile::tempdir().unwrap();
        // fresh, busy marker that a `tar.gz` extension would never match
        std::fs::write(dir.path().join("job.tar.gz"), "60").unwrap();

        let request = EvaluationRequest {
            marker_dir: dir.path().to_path_buf(),
            marker_extension: "tar.gz".into(),
            empty_dir_policy: EmptyDirPolicy::Idle,
            cycle_length_minutes: 60,
            threshold_minutes: 5,
            current_uptime_minutes: 58,
        };

        assert!(matches!(
            evaluate_request(&request, Local::now()),
            Err(IdlestopError::ConfigError(_))
        ));
    }

    #[test]
    fn test_evaluate_request_rejects_zero_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let request = EvaluationRequest {
            marker_dir: dir.path().to_path_buf(),
            marker_extension: "log".into(),
            empty_dir_policy: EmptyDirPolicy::Idle,
            cycle_length_minutes: 60,
            threshold_minutes: 0,
            current_uptime_minutes: 58,
        };

        assert!(matches!(
            evaluate_request(&request, Local::now()),
            Err(IdlestopError::ConfigError(_))
        ));
    }

    #[test]
    fn test_evaluate_request_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let request = EvaluationRequest {
            marker_dir: dir.path().join("missing"),
            marker_extension: "log".into(),
            empty_dir_policy: EmptyDirPolicy::Idle,
            cycle_length_minutes: 60,
            threshold_minutes: 5,
            current_uptime_minutes: 58,
        };

        assert!(matches!(
            evaluate_request(&request, Local::now()),
            Err(IdlestopError::MarkerDirectoryMissing { .. })
        ));
    }
}
