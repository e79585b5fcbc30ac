//! Plan-to-todo progress synchronization.
//!
//! Checked tasks in plan files are copied into the master todo file by
//! checking off the todo lines that mention them, and a short summary of
//! overall progress is written to the sync log.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::plan::{char_prefix, check_matching, completed_tasks, in_progress_tasks, PlanFile};

/// Characters of a completed task looked for in todo lines
pub const TODO_MATCH_CHARS: usize = 30;

/// How many recent completions the summary lists
pub const RECENT_COMPLETIONS: usize = 5;

/// A checked task found in a plan file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedTask {
    /// Plan file name
    pub file: String,
    pub task: String,
    /// `YYYY.MM.DD`
    pub date: String,
}

/// An unchecked task flagged as in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProgressTask {
    pub file: String,
    pub task: String,
}

/// Aggregated checkbox state of all plan files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncScan {
    pub completed: Vec<SyncedTask>,
    pub in_progress: Vec<InProgressTask>,
}

impl SyncScan {
    /// Percentage of tracked tasks that are complete.
    #[must_use]
    pub fn progress(&self) -> f64 {
        calculate_progress(self.completed.len(), self.in_progress.len())
    }
}

/// completed / (completed + in progress) × 100, rounded to one decimal.
/// Zero when there are no tasks.
#[must_use]
pub fn calculate_progress(completed: usize, in_progress: usize) -> f64 {
    let total = completed + in_progress;
    if total == 0 {
        return 0.0;
    }
    let percent = completed as f64 / total as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}

/// Collect completed and in-progress tasks from plan files, in file order.
///
/// A completed task takes its date from an existing `✅ (YYYY.MM.DD …)`
/// stamp, or `now` when it has none.
#[must_use]
pub fn scan_plans(plans: &[PlanFile], now: DateTime<Local>) -> SyncScan {
    let today = now.format("%Y.%m.%d").to_string();
    let mut scan = SyncScan::default();

    for plan in plans {
        let file = plan.name();

        for checkbox in completed_tasks(&plan.content) {
            let date = checkbox
                .done_date()
                .map(|d| d.format("%Y.%m.%d").to_string())
                .unwrap_or_else(|| today.clone());
            scan.completed.push(SyncedTask {
                file: file.clone(),
                task: checkbox.text,
                date,
            });
        }

        for task in in_progress_tasks(&plan.content) {
            scan.in_progress.push(InProgressTask {
                file: file.clone(),
                task,
            });
        }
    }

    debug!(
        "Scanned {} plan files: {} completed, {} in progress",
        plans.len(),
        scan.completed.len(),
        scan.in_progress.len()
    );
    scan
}

/// Check off every unchecked todo line containing the leading characters of
/// a completed task.
///
/// Returns the new content and how many lines changed.
#[must_use]
pub fn update_progress_in_content(content: &str, completed: &[SyncedTask]) -> (String, usize) {
    let mut current = content.to_string();
    let mut changed = 0;

    for task in completed {
        let key = char_prefix(&task.task, TODO_MATCH_CHARS);
        let stamp = format!("✅ ({} 완료)", task.date);
        if let Some((updated, count)) =
            check_matching(&current, |text| text.contains(key), &stamp, None)
        {
            current = updated;
            changed += count;
        }
    }

    (current, changed)
}

/// What happened to the todo file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoUpdate {
    /// Lines were checked off
    Updated(usize),
    Unchanged,
    Missing,
}

/// Render the sync summary.
#[must_use]
pub fn generate_summary(scan: &SyncScan, now: DateTime<Local>) -> String {
    let mut summary = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(summary, "📊 Progress Sync Report");
    let _ = writeln!(summary, "=======================");
    let _ = writeln!(summary, "📅 Date: {}", now.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(summary, "✅ Completed: {} tasks", scan.completed.len());
    let _ = writeln!(summary, "🔄 In Progress: {} tasks", scan.in_progress.len());
    let _ = writeln!(summary, "📈 Overall Progress: {:.1}%", scan.progress());
    summary.push('\n');
    let _ = writeln!(summary, "Recent Completions:");

    let skip = scan.completed.len().saturating_sub(RECENT_COMPLETIONS);
    for task in scan.completed.iter().skip(skip) {
        let head = char_prefix(&task.task, 50);
        let ellipsis = if head.len() < task.task.len() { "..." } else { "" };
        let _ = writeln!(summary, "  • {head}{ellipsis} ({})", task.date);
    }

    summary
}

/// Everything a sync run produced.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub scan: SyncScan,
    pub todo: TodoUpdate,
    pub todo_path: PathBuf,
    pub summary: String,
    pub log_path: PathBuf,
}

/// Synchronizes plan checkboxes into the todo file for one project.
#[derive(Debug, Clone)]
pub struct ProgressSync {
    root: PathBuf,
    config: ProjectConfig,
    now: DateTime<Local>,
}

impl ProgressSync {
    #[must_use]
    pub fn new(root: impl AsRef<Path>, config: ProjectConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
            now: Local::now(),
        }
    }

    /// Fix the clock used for dates in stamps and the summary.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    /// Rewrite the todo file from a scan.
    pub fn update_todo_file(&self, scan: &SyncScan) -> Result<TodoUpdate> {
        let todo_path = self.config.todo_path(&self.root);
        if !todo_path.exists() {
            warn!("Todo file not found: {}", todo_path.display());
            return Ok(TodoUpdate::Missing);
        }

        let content = fs::read_to_string(&todo_path)?;
        let (updated, changed) = update_progress_in_content(&content, &scan.completed);
        if changed == 0 {
            return Ok(TodoUpdate::Unchanged);
        }

        fs::write(&todo_path, updated)?;
        info!("Checked off {} lines in {}", changed, todo_path.display());
        Ok(TodoUpdate::Updated(changed))
    }

    /// Scan plans, update the todo file and write the summary log.
    pub fn run(&self) -> Result<SyncOutcome> {
        let plans = crate::plan::load_plan_files(&self.root, &self.config.plan_globs)?;
        let scan = scan_plans(&plans, self.now);
        let todo = self.update_todo_file(&scan)?;

        let summary = generate_summary(&scan, self.now);
        let log_path = self.config.sync_log_path(&self.root);
        fs::write(&log_path, &summary)?;

        Ok(SyncOutcome {
            scan,
            todo,
            todo_path: self.config.todo_path(&self.root),
            summary,
            log_path,
        })
    }
}
