//! Human-readable detection report.

use chrono::{DateTime, Local};
use std::fmt::Write;

use super::probe::ProbeOutcome;
use super::{CompletionRecord, PlanUpdate};
use crate::plan::char_prefix;

fn truncated(text: &str, max_chars: usize) -> String {
    let head = char_prefix(text, max_chars);
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

/// Render the report written to the report file and printed after a run.
///
/// `auto_update` tells whether the run was allowed to check tasks off.
#[must_use]
pub fn generate_report(
    now: DateTime<Local>,
    completions: &[CompletionRecord],
    updates: &[PlanUpdate],
    probe: &ProbeOutcome,
    auto_update: bool,
) -> String {
    let mut report = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(report, "🤖 Auto-Detection Report");
    let _ = writeln!(report, "========================");
    let _ = writeln!(report, "📅 Time: {}", now.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(report, "🔍 Detected Completions: {}", completions.len());
    if let ProbeOutcome::Unavailable(reason) = probe {
        let _ = writeln!(report, "⚠️  Service probe unavailable: {reason}");
    }
    report.push('\n');

    if !completions.is_empty() {
        let _ = writeln!(report, "✅ Completed Tasks (Auto-detected):");
        let _ = writeln!(report, "{}", "=".repeat(50));
        report.push('\n');

        for comp in completions {
            let _ = writeln!(report, "📌 Task: {}", truncated(&comp.task, 60));
            let _ = writeln!(report, "   Confidence: {}%", comp.confidence);
            let _ = writeln!(report, "   Evidence:");
            for ev in &comp.evidence {
                let _ = writeln!(report, "     • {ev}");
            }
            report.push('\n');
        }
    }

    if !updates.is_empty() {
        let _ = writeln!(report, "📝 Files Updated:");
        let _ = writeln!(report, "{}", "-".repeat(30));
        for update in updates {
            let _ = writeln!(
                report,
                "  • {}: {}",
                update.file,
                truncated(&update.task, 40)
            );
        }
    } else if completions.is_empty() {
        let _ = writeln!(report, "ℹ️  No new completions detected.");
        report.push('\n');
        let _ = writeln!(report, "💡 Hints for detection:");
        let _ = writeln!(report, "  • Create/modify implementation files");
        let _ = writeln!(report, "  • Run tests");
        let _ = writeln!(report, "  • Keep dev server running");
    } else if auto_update {
        let _ = writeln!(
            report,
            "ℹ️  No unchecked plan line matched the detected tasks; nothing was checked off."
        );
    } else {
        let _ = writeln!(report, "ℹ️  Dry run: use --auto to check these tasks off.");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::probe::ServiceSignals;

    fn record(task: &str) -> CompletionRecord {
        CompletionRecord {
            task: task.to_string(),
            confidence: 70,
            evidence: vec![
                "File created/modified: LeaveExcelService.js".to_string(),
                "Related files changed: backend/routes/admin/leaveAdmin.js".to_string(),
            ],
            timestamp: Local::now(),
        }
    }

    #[test]
    fn test_report_without_completions_has_hints() {
        let report = generate_report(
            Local::now(),
            &[],
            &[],
            &ProbeOutcome::Available(ServiceSignals::default()),
            false,
        );
        assert!(report.contains("Detected Completions: 0"));
        assert!(report.contains("No new completions detected."));
        assert!(report.contains("Hints for detection"));
        assert!(!report.contains("probe unavailable"));
    }

    #[test]
    fn test_report_lists_completions_and_updates() {
        let long_task = "Excel export for the admin leave overview including filters and totals";
        let completions = vec![record(long_task)];
        let updates = vec![PlanUpdate {
            file: "FEAT-001-plan.md".to_string(),
            task: long_task.to_string(),
            confidence: 70,
        }];

        let report = generate_report(
            Local::now(),
            &completions,
            &updates,
            &ProbeOutcome::Unavailable("ps not found".to_string()),
            true,
        );

        assert!(report.contains("Confidence: 70%"));
        assert!(report.contains("     • File created/modified: LeaveExcelService.js"));
        assert!(report.contains(&format!("📌 Task: {}...", char_prefix(long_task, 60))));
        assert!(report.contains(&format!(
            "  • FEAT-001-plan.md: {}...",
            char_prefix(long_task, 40)
        )));
        assert!(report.contains("Service probe unavailable: ps not found"));
        assert!(!report.contains("Hints for detection"));
    }

    #[test]
    fn test_report_dry_run_hint() {
        let report = generate_report(
            Local::now(),
            &[record("Short task")],
            &[],
            &ProbeOutcome::Available(ServiceSignals::default()),
            false,
        );
        assert!(report.contains("📌 Task: Short task\n"));
        assert!(report.contains("Dry run: use --auto"));
    }

    #[test]
    fn test_report_auto_run_without_matching_line() {
        let report = generate_report(
            Local::now(),
            &[record("Short task")],
            &[],
            &ProbeOutcome::Available(ServiceSignals::default()),
            true,
        );
        assert!(report.contains("nothing was checked off"));
        assert!(!report.contains("Dry run"));
    }
}
