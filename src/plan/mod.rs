//! Plan file discovery.
//!
//! Plan files are markdown checklists sitting directly in the project root
//! (`*-plan.md`, `FEAT-*-plan.md` by default). Both the detector and the
//! sync command read them through [`load_plan_files`].

pub mod parsing;

pub use parsing::{
    char_prefix, check_matching, checked_line, completed_tasks, in_progress_tasks,
    parse_checkbox_line, pending_tasks, scan_checkboxes, Checkbox,
};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PlanmarkError, Result};

/// A plan file read into memory.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub path: PathBuf,
    pub content: String,
}

impl PlanFile {
    /// File name used in reports and provenance
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Write new content back to disk and keep the in-memory copy current.
    pub fn write(&mut self, content: String) -> Result<()> {
        fs::write(&self.path, &content)
            .with_context(|| format!("Failed to write plan file: {}", self.path.display()))?;
        self.content = content;
        Ok(())
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| PlanmarkError::invalid_config("planGlobs", e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| PlanmarkError::invalid_config("planGlobs", e.to_string()))
}

/// Find plan files directly inside `root`, sorted by file name.
///
/// A file matching several globs is listed once.
pub fn discover_plan_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let globs = build_globset(patterns)?;

    let mut plans: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("Failed to read project directory: {}", root.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| globs.is_match(entry.file_name()))
        .map(|entry| entry.path())
        .collect();

    plans.sort();
    debug!("Found {} plan files in {}", plans.len(), root.display());
    Ok(plans)
}

/// Discover and read every plan file.
pub fn load_plan_files(root: &Path, patterns: &[String]) -> Result<Vec<PlanFile>> {
    discover_plan_files(root, patterns)?
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
            Ok(PlanFile { path, content })
        })
        .collect()
}
