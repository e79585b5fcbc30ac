//! Temporary project trees for tests.

use std::path::Path;
use tempfile::TempDir;

use crate::config::ProjectConfig;
use crate::plan::{load_plan_files, PlanFile};

/// A temporary project directory, removed on drop.
pub struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Empty project.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Leave management project with one plan, a todo list, a freshly
    /// written Excel service and a fresh test report.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn hr_project() -> Self {
        Self::new()
            .with_file("FEAT-001-plan.md", Self::hr_plan_content())
            .with_file("todo-development.md", Self::hr_todo_content())
            .with_file(
                "backend/services/LeaveExcelService.js",
                "module.exports = { exportLeaves() {} };\n",
            )
            .with_file("backend/routes/leave.js", "module.exports = {};\n")
            .with_file("frontend/src/App.tsx", "export default function App() {}\n")
            .with_file("test-results.json", r#"{"numFailedTests": 0}"#)
    }

    /// Write a file relative to the project root, creating parent dirs.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.temp_dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write fixture file");
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(rel))
            .expect("Failed to read fixture file")
    }

    /// Plan files matched by the default globs.
    ///
    /// # Panics
    ///
    /// Panics if a plan file cannot be read.
    #[must_use]
    pub fn plan_files(&self) -> Vec<PlanFile> {
        load_plan_files(self.path(), &ProjectConfig::default().plan_globs)
            .expect("Failed to load plan files")
    }

    fn hr_plan_content() -> &'static str {
        r#"# FEAT-001: Leave management

**작성일**: 2026년 01월 05일
**수정일**: 2026년 01월 05일

## Tasks

- [x] Leave request form
- [ ] Approval notifications 🔄
- [ ] Excel export for admin overview
- [ ] Virtual scroll for the leave list
"#
    }

    fn hr_todo_content() -> &'static str {
        r#"# Development TODO

## Frontend
- [ ] Leave request form (frontend)
- [ ] Approval notifications (email)

## Backend
- [x] Database schema ✅ (2026.01.02 완료)
"#
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
