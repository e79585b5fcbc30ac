//! Persisted detector state.
//!
//! The state file is a flat JSON object keyed by snake_case names, so state
//! written by earlier versions of the tool loads unchanged. Saves go through
//! a temporary file and a rename while holding an exclusive lock.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{PlanmarkError, Result};

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Lock file suffix for concurrent access prevention.
const LOCK_SUFFIX: &str = ".lock";

/// Detector memory between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Absolute path to md5 hex digest of the file's content
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,

    /// Kept for compatibility with older state files; never populated
    #[serde(default)]
    pub test_results: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub last_check: Option<String>,

    #[serde(default)]
    pub completed_tasks: Vec<String>,
}

impl ProgressState {
    /// Time of the previous run.
    ///
    /// Accepts RFC 3339 and offset-less ISO timestamps; the latter are read
    /// as local time.
    #[must_use]
    pub fn last_check_time(&self) -> Option<DateTime<Local>> {
        let raw = self.last_check.as_deref()?;

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Local));
        }

        match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => Local.from_local_datetime(&naive).earliest(),
            Err(e) => {
                warn!("Ignoring unreadable last_check '{}': {}", raw, e);
                None
            }
        }
    }

    pub fn set_last_check(&mut self, now: DateTime<Local>) {
        self.last_check = Some(now.to_rfc3339());
    }
}

/// Reads and writes [`ProgressState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Temporary file a save writes before renaming it into place.
    #[must_use]
    pub fn tmp_path(&self) -> PathBuf {
        self.sibling(TMP_SUFFIX)
    }

    /// Lock file next to the state file.
    ///
    /// Kept after a save; writers serialize on it.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.sibling(LOCK_SUFFIX)
    }

    /// Load the state, or a fresh one if no state file exists.
    ///
    /// # Errors
    ///
    /// Returns [`PlanmarkError::StateCorrupt`] if the file is not valid state
    /// JSON.
    pub fn load(&self) -> Result<ProgressState> {
        if !self.path.exists() {
            debug!("No progress state at {}", self.path.display());
            return Ok(ProgressState::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents)
            .map_err(|e| PlanmarkError::state_corrupt(self.path.clone(), e.to_string()))
    }

    /// Save the state atomically.
    pub fn save(&self, state: &ProgressState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = File::create(self.lock_path())?;
        FileExt::lock_exclusive(&lock_file).map_err(|e| PlanmarkError::StateLock {
            message: e.to_string(),
        })?;

        let tmp_path = self.tmp_path();
        let json = serde_json::to_string_pretty(state)?;

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, &self.path)?;
        debug!("Saved progress state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_default() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path().join(".progress-state.json"));
        assert_eq!(store.load().unwrap(), ProgressState::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path().join(".progress-state.json"));

        let mut state = ProgressState::default();
        state
            .file_hashes
            .insert("/proj/frontend/package.json".to_string(), "abc".to_string());
        state.completed_tasks.push("Excel export".to_string());
        state.set_last_check(Local::now());

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(!temp.path().join(".progress-state.json.tmp").exists());
    }

    #[test]
    fn test_save_leaves_only_state_and_lock_file() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path().join(".progress-state.json"));

        store.save(&ProgressState::default()).unwrap();
        store.save(&ProgressState::default()).unwrap();

        assert_eq!(
            store.lock_path(),
            temp.path().join(".progress-state.json.lock")
        );
        assert!(store.lock_path().exists());
        assert!(!store.tmp_path().exists());
        let mut names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![".progress-state.json", ".progress-state.json.lock"]
        );
    }

    #[test]
    fn test_load_older_state_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".progress-state.json");
        fs::write(
            &path,
            r#"{
  "file_hashes": {"/mnt/d/proj/frontend/package.json": "d41d8cd98f00b204e9800998ecf8427e"},
  "test_results": {},
  "last_check": "2025-08-21T09:30:15.123456",
  "completed_tasks": ["Excel export"]
}"#,
        )
        .unwrap();

        let state = StateStore::new(&path).load().unwrap();
        assert_eq!(state.file_hashes.len(), 1);
        assert_eq!(state.completed_tasks, vec!["Excel export"]);

        let last = state.last_check_time().unwrap();
        assert_eq!(last.year(), 2025);
        assert_eq!(last.month(), 8);
        assert_eq!(last.day(), 21);
        assert_eq!(last.hour(), 9);
        assert_eq!(last.minute(), 30);
    }

    #[test]
    fn test_load_corrupt_state_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".progress-state.json");
        fs::write(&path, "{ not json").unwrap();

        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PlanmarkError::StateCorrupt { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_last_check_rfc3339_round_trip() {
        let mut state = ProgressState::default();
        let now = Local::now();
        state.set_last_check(now);
        assert_eq!(state.last_check_time(), Some(now));
    }

    #[test]
    fn test_last_check_unreadable_is_none() {
        let state = ProgressState {
            last_check: Some("yesterday".to_string()),
            ..ProgressState::default()
        };
        assert_eq!(state.last_check_time(), None);
    }
}
