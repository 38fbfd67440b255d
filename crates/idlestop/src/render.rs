//! Human-readable and JSON rendering of an evaluation

use idlestop_api::{EvaluationReport, MarkerReport};
use idlestop_util::{format_datetime_full, format_minutes};
use std::fmt::Write;

use crate::RunResult;

/// Multi-line summary for a terminal
pub fn render_text(report: &EvaluationReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Evaluated at: {}", format_datetime_full(&report.evaluated_at));
    let _ = writeln!(out, "Uptime:       {}", format_minutes(report.uptime_minutes));

    if report.markers.is_empty() {
        let _ = writeln!(out, "Markers:      none");
    } else {
        let _ = writeln!(out, "Markers:");
        for marker in &report.markers {
            let _ = writeln!(out, "  {}", marker_line(marker));
        }
    }

    let _ = writeln!(out, "Machine:      {}", report.idle_state);
    let _ = writeln!(
        out,
        "Billing:      {} of {} paid minutes left{}",
        report.billing.remaining_minutes(),
        report.billing.cycle_length_minutes,
        if report.billing.in_boot_block {
            " (boot block)"
        } else {
            ""
        }
    );
    let _ = writeln!(out, "Decision:     {} ({})", report.decision, report.reason);

    out
}

fn marker_line(marker: &MarkerReport) -> String {
    if marker.malformed {
        return format!("{:<24} malformed, counted as {}", marker.name, marker.verdict);
    }

    let elapsed = marker
        .elapsed_minutes
        .map(format_minutes)
        .unwrap_or_else(|| "?".into());
    let timeout = marker
        .timeout_minutes
        .map(format_minutes)
        .unwrap_or_else(|| "?".into());

    format!("{:<24} {} idle of {} -> {}", marker.name, elapsed, timeout, marker.verdict)
}

/// Pretty-printed JSON document: the report's fields plus `outcome`
pub fn render_json(result: &RunResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}
