//! Heuristic completion detection for plan tasks.
//!
//! # Architecture
//!
//! ```text
//! ProgressDetector
//!   ├── signals   - watched file hashes, test report freshness,
//!   │               plan task classification, fresh implementation files
//!   ├── probe     - dev server detection (ss / ps)
//!   ├── scoring   - weighted confidence score and threshold
//!   ├── state     - JSON state carried between runs
//!   └── report    - text report of a run
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use planmark::detect::ProgressDetector;
//! use planmark::ProjectConfig;
//!
//! let config = ProjectConfig::load(&root)?;
//! let outcome = ProgressDetector::new(&root, config).run(false)?;
//! println!("{}", outcome.report);
//! ```

pub mod probe;
pub mod report;
pub mod scoring;
pub mod signals;
pub mod state;

pub use probe::{ProbeOutcome, ServiceProbe, ServiceProbeConfig, ServiceSignals, SystemProbe};
pub use report::generate_report;
pub use scoring::{ScoringConfig, TaskSignals};
pub use state::{ProgressState, StateStore};

use chrono::{DateTime, Duration, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::plan::{char_prefix, check_matching, load_plan_files, PlanFile};
use signals::ImplementationEvidence;

/// Characters of a task used to find its checkbox again
pub const TASK_MATCH_CHARS: usize = 50;

/// A task judged complete in this run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRecord {
    pub task: String,
    /// 0 to 100
    pub confidence: u32,
    pub evidence: Vec<String>,
    pub timestamp: DateTime<Local>,
}

/// A checkbox the detector checked off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanUpdate {
    /// Plan file name
    pub file: String,
    pub task: String,
    pub confidence: u32,
}

/// Everything a detector run produced.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub completions: Vec<CompletionRecord>,
    pub updates: Vec<PlanUpdate>,
    pub probe: ProbeOutcome,
    pub report: String,
    pub report_path: PathBuf,
}

/// Score every task with implementation evidence and keep those at or above
/// the threshold.
#[must_use]
pub fn score_completions(
    evidence: &[ImplementationEvidence],
    code_changes: &BTreeMap<String, Vec<String>>,
    tests_recent: bool,
    dev_mode: bool,
    scoring: &ScoringConfig,
    now: DateTime<Local>,
) -> Vec<CompletionRecord> {
    let mut completions = Vec::new();

    for item in evidence {
        let changed = code_changes.get(&item.feature);
        let task_signals = TaskSignals {
            file_evidence: true,
            type_match: changed.is_some(),
            tests_recent,
            dev_mode,
        };

        let mut lines = vec![item.evidence.clone()];
        if let Some(files) = changed {
            lines.push(format!("Related files changed: {}", files.join(", ")));
        }
        if tests_recent {
            lines.push("Tests executed recently".to_string());
        }
        if dev_mode {
            lines.push("Development server running".to_string());
        }

        let score = scoring.score(&task_signals);
        debug!("Task '{}' scored {}", item.task, score);
        if scoring.is_complete(score) {
            completions.push(CompletionRecord {
                task: item.task.clone(),
                confidence: score,
                evidence: lines,
                timestamp: now,
            });
        }
    }

    completions
}

/// Stamp appended to checkboxes the detector checks off
#[must_use]
pub fn detection_stamp(now: DateTime<Local>) -> String {
    format!("✅ ({} 자동 감지)", now.format("%Y.%m.%d"))
}

/// Check off the first unchecked line, across plan files in order, whose
/// text starts with each completed task's leading characters.
pub fn update_plan_files(
    plans: &mut [PlanFile],
    completions: &[CompletionRecord],
    now: DateTime<Local>,
) -> Result<Vec<PlanUpdate>> {
    let stamp = detection_stamp(now);
    let mut updates = Vec::new();

    for completion in completions {
        let key = char_prefix(&completion.task, TASK_MATCH_CHARS);

        for plan in plans.iter_mut() {
            let Some((content, _)) =
                check_matching(&plan.content, |text| text.starts_with(key), &stamp, Some(1))
            else {
                continue;
            };

            plan.write(content)?;
            info!("Checked off '{}' in {}", key, plan.name());
            updates.push(PlanUpdate {
                file: plan.name(),
                task: completion.task.clone(),
                confidence: completion.confidence,
            });
            break;
        }
    }

    Ok(updates)
}

/// Runs the detection pipeline for one project.
pub struct ProgressDetector {
    root: PathBuf,
    config: ProjectConfig,
    probe: Box<dyn ServiceProbe>,
    now: DateTime<Local>,
}

impl ProgressDetector {
    /// Create a detector using the system probe and the current time.
    ///
    /// A relative `root` is resolved against the working directory.
    #[must_use]
    pub fn new(root: impl AsRef<Path>, config: ProjectConfig) -> Self {
        let root = root.as_ref();
        Self {
            root: std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()),
            config,
            probe: Box::new(SystemProbe),
            now: Local::now(),
        }
    }

    #[must_use]
    pub fn with_probe(mut self, probe: impl ServiceProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Fix the clock used for freshness checks, stamps and the report.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    #[must_use]
    pub fn state_store(&self) -> StateStore {
        StateStore::new(self.config.state_path(&self.root))
    }

    /// Collect all signals and score the classified tasks.
    ///
    /// Updates the file hashes in `state`; does not save it.
    pub fn infer_completions(
        &self,
        plans: &[PlanFile],
        state: &mut ProgressState,
    ) -> Result<(Vec<CompletionRecord>, ProbeOutcome)> {
        let code_changes =
            signals::detect_code_changes(&self.root, &self.config.watched_files, state)?;
        let fresh_reports = signals::check_test_results(
            &self.root,
            &self.config.test_reports,
            state.last_check_time(),
        );
        let patterns = signals::analyze_plan_files(plans, &self.config);

        let cutoff = self.now - Duration::hours(self.config.freshness_hours as i64);
        let fresh = signals::fresh_files(
            &self.root,
            &self.config.scan_dirs,
            &self.config.ignore_dirs,
            cutoff,
        );
        let evidence = signals::detect_implementation(&patterns, &fresh);

        let probe = self.probe.probe(&self.config.services);
        if let ProbeOutcome::Unavailable(reason) = &probe {
            warn!("Service probe unavailable: {}", reason);
        }

        debug!(
            "Signals: {} changed features, {} fresh test reports, {} tasks with evidence",
            code_changes.len(),
            fresh_reports.len(),
            evidence.len()
        );

        let completions = score_completions(
            &evidence,
            &code_changes,
            !fresh_reports.is_empty(),
            probe.dev_mode(),
            &self.config.scoring,
            self.now,
        );
        Ok((completions, probe))
    }

    /// Run detection, optionally check off detected tasks, persist state
    /// and write the report.
    pub fn run(&self, auto_update: bool) -> Result<DetectionOutcome> {
        let store = self.state_store();
        let mut state = store.load()?;
        let mut plans = load_plan_files(&self.root, &self.config.plan_globs)?;

        let (completions, probe) = self.infer_completions(&plans, &mut state)?;

        let updates = if auto_update && !completions.is_empty() {
            update_plan_files(&mut plans, &completions, self.now)?
        } else {
            Vec::new()
        };

        state.set_last_check(self.now);
        state
            .completed_tasks
            .extend(completions.iter().map(|c| c.task.clone()));
        store.save(&state)?;

        let report = generate_report(self.now, &completions, &updates, &probe, auto_update);
        let report_path = self.config.report_path(&self.root);
        fs::write(&report_path, &report)?;
        info!("Wrote detection report to {}", report_path.display());

        Ok(DetectionOutcome {
            completions,
            updates,
            probe,
            report,
            report_path,
        })
    }
}
