//! Signal collection for the progress detector.
//!
//! Each collector is independent and best-effort: unreadable entries are
//! skipped with a log line rather than failing the run.

use chrono::{DateTime, Local};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::state::ProgressState;
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::plan::{pending_tasks, PlanFile};

// ============================================================================
// Code Changes
// ============================================================================

/// md5 hex digest of a file's content.
pub fn file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

/// Find features whose watched files changed since the last run.
///
/// Every existing watched file has its current hash recorded in `state`,
/// keyed by absolute path (a relative `root` is resolved against the
/// working directory). A file only counts as changed when a previous hash
/// exists and differs.
pub fn detect_code_changes(
    root: &Path,
    watched: &BTreeMap<String, Vec<String>>,
    state: &mut ProgressState,
) -> Result<BTreeMap<String, Vec<String>>> {
    let mut changes: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (feature, files) in watched {
        for rel in files {
            let full_path = root.join(rel);
            if !full_path.is_file() {
                continue;
            }

            let current = file_hash(&full_path)?;
            let key = std::path::absolute(&full_path)?
                .to_string_lossy()
                .into_owned();

            if let Some(previous) = state.file_hashes.get(&key) {
                if *previous != current {
                    debug!("{} changed ({})", rel, feature);
                    changes.entry(feature.clone()).or_default().push(rel.clone());
                }
            }

            state.file_hashes.insert(key, current);
        }
    }

    Ok(changes)
}

// ============================================================================
// Test Reports
// ============================================================================

fn modified_time(path: &Path) -> Option<DateTime<Local>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Local>::from)
        .ok()
}

/// Test report files written after `last_check` (all existing reports when
/// there was no previous run).
#[must_use]
pub fn check_test_results(
    root: &Path,
    reports: &[String],
    last_check: Option<DateTime<Local>>,
) -> Vec<String> {
    reports
        .iter()
        .filter(|rel| {
            let Some(mtime) = modified_time(&root.join(rel)) else {
                return false;
            };
            last_check.map_or(true, |last| mtime > last)
        })
        .cloned()
        .collect()
}

// ============================================================================
// Plan Analysis
// ============================================================================

/// A pending task claimed by a feature rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPattern {
    pub task: String,
    pub feature: String,
    pub file_patterns: Vec<String>,
}

/// Classify the pending tasks of all plan files.
///
/// Tasks no rule claims are dropped; repeated task texts keep their first
/// occurrence.
#[must_use]
pub fn analyze_plan_files(plans: &[PlanFile], config: &ProjectConfig) -> Vec<TaskPattern> {
    let mut seen = HashSet::new();
    let mut patterns = Vec::new();

    for plan in plans {
        for task in pending_tasks(&plan.content) {
            let Some(rule) = config.feature_for(&task) else {
                continue;
            };
            if !seen.insert(task.clone()) {
                continue;
            }
            patterns.push(TaskPattern {
                task,
                feature: rule.name.clone(),
                file_patterns: rule.file_patterns.clone(),
            });
        }
    }

    debug!("{} pending tasks matched feature rules", patterns.len());
    patterns
}

// ============================================================================
// Implementation Evidence
// ============================================================================

/// A recently modified file or directory found under a scan directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshFile {
    pub name: String,
    pub path: PathBuf,
}

fn is_fresh(metadata: &fs::Metadata, cutoff: DateTime<Local>) -> bool {
    metadata
        .modified()
        .map(DateTime::<Local>::from)
        .is_ok_and(|mtime| mtime >= cutoff)
}

/// Fresh immediate children of an ignored directory, sorted by name.
///
/// This is how installed packages (`node_modules/react-window`) show up
/// without walking the dependency tree.
fn fresh_children(dir: &Path, cutoff: DateTime<Local>) -> Vec<FreshFile> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut children: Vec<FreshFile> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.metadata().is_ok_and(|m| is_fresh(&m, cutoff)))
        .map(|entry| FreshFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
        })
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}

/// Files and directories under the scan directories modified at or after
/// `cutoff`.
///
/// Directories named in `ignore_dirs` are not descended into; only their
/// immediate children are considered. Results are ordered by scan
/// directory, then in walk order.
#[must_use]
pub fn fresh_files(
    root: &Path,
    scan_dirs: &[String],
    ignore_dirs: &[String],
    cutoff: DateTime<Local>,
) -> Vec<FreshFile> {
    let ignored: HashSet<&str> = ignore_dirs.iter().map(String::as_str).collect();
    let mut found = Vec::new();

    for dir in scan_dirs {
        let base = root.join(dir);
        if !base.is_dir() {
            continue;
        }

        let mut walker = WalkDir::new(&base).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", base.display(), e);
                    continue;
                }
            };
            let file_type = entry.file_type();
            if entry.depth() == 0 || !(file_type.is_file() || file_type.is_dir()) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let skip_tree = file_type.is_dir() && ignored.contains(name.as_str());

            if entry.metadata().is_ok_and(|m| is_fresh(&m, cutoff)) {
                found.push(FreshFile {
                    name,
                    path: entry.path().to_path_buf(),
                });
            }

            if skip_tree {
                walker.skip_current_dir();
                found.extend(fresh_children(entry.path(), cutoff));
            }
        }
    }

    found
}

/// Evidence that a task has been worked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationEvidence {
    pub task: String,
    pub feature: String,
    pub evidence: String,
    pub path: PathBuf,
}

/// Match tasks against fresh files; one piece of evidence per task, taken
/// from the first file pattern that has a match.
#[must_use]
pub fn detect_implementation(
    patterns: &[TaskPattern],
    fresh: &[FreshFile],
) -> Vec<ImplementationEvidence> {
    patterns
        .iter()
        .filter_map(|pattern| {
            pattern.file_patterns.iter().find_map(|needle| {
                fresh
                    .iter()
                    .find(|file| file.name.contains(needle.as_str()))
                    .map(|file| ImplementationEvidence {
                        task: pattern.task.clone(),
                        feature: pattern.feature.clone(),
                        evidence: format!("File created/modified: {}", file.name),
                        path: file.path.clone(),
                    })
            })
        })
        .collect()
}
