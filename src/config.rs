//! Configuration management for planmark.
//!
//! Settings live in `<project>/.planmark/settings.json`. Every field is
//! optional; the defaults reproduce the layout of the project the tool was
//! first written for (plan files at the root, a `frontend/` and `backend/`
//! tree, dev servers on fixed ports).
//!
//! # Example settings.json
//!
//! ```json
//! {
//!   "todoFile": "TODO.md",
//!   "features": [
//!     { "name": "charts", "keywords": ["chart"], "filePatterns": ["LeaveCharts"] }
//!   ],
//!   "scoring": { "threshold": 70 }
//! }
//! ```

use crate::detect::probe::ServiceProbeConfig;
use crate::detect::scoring::ScoringConfig;
use crate::error::{PlanmarkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file, relative to the project root
pub const SETTINGS_DIR: &str = ".planmark";

/// Settings file name inside [`SETTINGS_DIR`]
pub const SETTINGS_FILE: &str = "settings.json";

/// Upper bound for `freshnessHours` (ten years)
pub const MAX_FRESHNESS_HOURS: u64 = 24 * 365 * 10;

/// Default directories skipped while scanning for implementation files
pub fn default_ignore_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        ".next",
        "dist",
        "build",
        "coverage",
        ".turbo",
        ".cache",
        "target",
        "__pycache__",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// A rule tying plan task wording to implementation file names.
///
/// A pending task belongs to the first rule with a keyword contained in the
/// task text (case-insensitive). Files whose name contains one of
/// `file_patterns` count as evidence for that task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRule {
    /// Feature name, also the key into `watchedFiles`
    pub name: String,
    pub keywords: Vec<String>,
    pub file_patterns: Vec<String>,
}

impl FeatureRule {
    fn new(name: &str, keywords: &[&str], file_patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            file_patterns: file_patterns.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Check whether a task's text falls under this rule
    #[must_use]
    pub fn matches(&self, task: &str) -> bool {
        let lowered = task.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| lowered.contains(&keyword.to_lowercase()))
    }
}

fn default_features() -> Vec<FeatureRule> {
    vec![
        FeatureRule::new(
            "excel_export",
            &["excel"],
            &["LeaveExcelService", "exportExcel"],
        ),
        FeatureRule::new(
            "virtual_scroll",
            &["virtual", "scroll"],
            &["VirtualScroll", "react-window"],
        ),
        FeatureRule::new("test", &["test"], &[".test.", ".spec."]),
    ]
}

fn default_watched_files() -> BTreeMap<String, Vec<String>> {
    let entries: [(&str, &[&str]); 3] = [
        (
            "excel_export",
            &[
                "backend/routes/admin/leaveAdmin.js",
                "backend/services/LeaveExcelService.js",
                "frontend/src/components/UnifiedLeaveOverview.tsx",
            ],
        ),
        (
            "virtual_scroll",
            &[
                "frontend/src/components/VirtualScrollList.tsx",
                "frontend/package.json",
            ],
        ),
        (
            "charts",
            &[
                "frontend/src/components/LeaveCharts.tsx",
                "frontend/package.json",
            ],
        ),
    ];
    entries
        .into_iter()
        .map(|(feature, files)| {
            (
                feature.to_string(),
                files.iter().map(|f| f.to_string()).collect(),
            )
        })
        .collect()
}

fn default_plan_globs() -> Vec<String> {
    vec!["*-plan.md".to_string(), "FEAT-*-plan.md".to_string()]
}

fn default_test_reports() -> Vec<String> {
    vec![
        "frontend/coverage/coverage-summary.json".to_string(),
        "backend/coverage/coverage-summary.json".to_string(),
        "test-results.json".to_string(),
    ]
}

fn default_scan_dirs() -> Vec<String> {
    vec!["frontend".to_string(), "backend".to_string()]
}

fn default_todo_file() -> String {
    "todo-development.md".to_string()
}

fn default_state_file() -> String {
    ".progress-state.json".to_string()
}

fn default_report_file() -> String {
    ".detection-report.md".to_string()
}

fn default_sync_log() -> String {
    ".sync-log.txt".to_string()
}

fn default_freshness_hours() -> u64 {
    24
}

/// Project configuration loaded from `.planmark/settings.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// File name globs selecting plan files in the project root
    #[serde(default = "default_plan_globs")]
    pub plan_globs: Vec<String>,

    #[serde(default = "default_todo_file")]
    pub todo_file: String,

    /// Detector state; a `<state file>.lock` sibling is kept next to it
    #[serde(default = "default_state_file")]
    pub state_file: String,

    #[serde(default = "default_report_file")]
    pub report_file: String,

    #[serde(default = "default_sync_log")]
    pub sync_log: String,

    #[serde(default = "default_features")]
    pub features: Vec<FeatureRule>,

    /// Feature name to files whose content hash is tracked between runs
    #[serde(default = "default_watched_files")]
    pub watched_files: BTreeMap<String, Vec<String>>,

    /// Test report files whose modification time signals a recent test run
    #[serde(default = "default_test_reports")]
    pub test_reports: Vec<String>,

    /// Directories searched for implementation files
    #[serde(default = "default_scan_dirs")]
    pub scan_dirs: Vec<String>,

    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// How recently a file must have been modified to count as evidence
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: u64,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub services: ServiceProbeConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            plan_globs: default_plan_globs(),
            todo_file: default_todo_file(),
            state_file: default_state_file(),
            report_file: default_report_file(),
            sync_log: default_sync_log(),
            features: default_features(),
            watched_files: default_watched_files(),
            test_reports: default_test_reports(),
            scan_dirs: default_scan_dirs(),
            ignore_dirs: default_ignore_dirs(),
            freshness_hours: default_freshness_hours(),
            scoring: ScoringConfig::default(),
            services: ServiceProbeConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a project directory.
    ///
    /// A missing settings file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PlanmarkError::Config`] if the file cannot be read or parsed,
    /// and [`PlanmarkError::InvalidConfig`] if a value fails validation.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let settings_path = Self::settings_path(project_dir);

        let config = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path).map_err(|e| {
                PlanmarkError::config_with_path(e.to_string(), settings_path.clone())
            })?;
            serde_json::from_str::<ProjectConfig>(&content).map_err(|e| {
                PlanmarkError::config_with_path(e.to_string(), settings_path.clone())
            })?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Get the settings.json path for a project
    pub fn settings_path(project_dir: &Path) -> PathBuf {
        project_dir.join(SETTINGS_DIR).join(SETTINGS_FILE)
    }

    /// Validate values that would otherwise fail later in a run.
    pub fn validate(&self) -> Result<()> {
        if self.plan_globs.is_empty() {
            return Err(PlanmarkError::invalid_config(
                "planGlobs",
                "at least one glob is required",
            ));
        }
        for pattern in &self.plan_globs {
            globset::Glob::new(pattern)
                .map_err(|e| PlanmarkError::invalid_config("planGlobs", e.to_string()))?;
        }
        if self.freshness_hours == 0 || self.freshness_hours > MAX_FRESHNESS_HOURS {
            return Err(PlanmarkError::invalid_config(
                "freshnessHours",
                format!("must be between 1 and {MAX_FRESHNESS_HOURS}"),
            ));
        }
        for rule in &self.features {
            if rule.keywords.iter().any(|k| k.is_empty()) {
                return Err(PlanmarkError::invalid_config(
                    "features",
                    format!("rule '{}' has an empty keyword", rule.name),
                ));
            }
        }
        self.scoring
            .validate()
            .map_err(|reason| PlanmarkError::invalid_config("scoring", reason))
    }

    pub fn todo_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.todo_file)
    }

    pub fn state_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.state_file)
    }

    pub fn report_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.report_file)
    }

    pub fn sync_log_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.sync_log)
    }

    /// Find the first feature rule that claims a task
    #[must_use]
    pub fn feature_for(&self, task: &str) -> Option<&FeatureRule> {
        self.features.iter().find(|rule| rule.matches(task))
    }
}
