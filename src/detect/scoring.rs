//! Confidence scoring for detected completions.
//!
//! A task with implementation evidence earns a fixed number of points per
//! signal present. The sum is capped at 100 and compared to a threshold.

use serde::{Deserialize, Serialize};

/// Signals observed for one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSignals {
    /// A matching implementation file was created or modified recently
    pub file_evidence: bool,
    /// A watched file of the task's feature changed since the last run
    pub type_match: bool,
    /// A test report was written since the last run
    pub tests_recent: bool,
    /// A dev server process is running
    pub dev_mode: bool,
}

/// Points per signal and the completion threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    #[serde(default = "default_file_evidence")]
    pub file_evidence: u32,
    #[serde(default = "default_type_match")]
    pub type_match: u32,
    #[serde(default = "default_tests_recent")]
    pub tests_recent: u32,
    #[serde(default = "default_dev_mode")]
    pub dev_mode: u32,
    /// Minimum score for a task to count as complete
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

fn default_file_evidence() -> u32 {
    40
}

fn default_type_match() -> u32 {
    30
}

fn default_tests_recent() -> u32 {
    20
}

fn default_dev_mode() -> u32 {
    10
}

fn default_threshold() -> u32 {
    60
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            file_evidence: default_file_evidence(),
            type_match: default_type_match(),
            tests_recent: default_tests_recent(),
            dev_mode: default_dev_mode(),
            threshold: default_threshold(),
        }
    }
}

/// Highest score a task can reach
pub const MAX_SCORE: u32 = 100;

impl ScoringConfig {
    /// Total points available when every signal is present.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.file_evidence + self.type_match + self.tests_recent + self.dev_mode
    }

    /// Validates the scoring configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is zero, above 100, or higher than
    /// the points that can be earned.
    pub fn validate(&self) -> Result<(), String> {
        if self.threshold == 0 {
            return Err("threshold must be greater than zero".to_string());
        }
        if self.threshold > MAX_SCORE {
            return Err(format!(
                "threshold {} exceeds the maximum score of {}",
                self.threshold, MAX_SCORE
            ));
        }
        let reachable = self.total_weight().min(MAX_SCORE);
        if self.threshold > reachable {
            return Err(format!(
                "threshold {} is unreachable with a total weight of {}",
                self.threshold, reachable
            ));
        }
        Ok(())
    }

    /// Score a task's signals.
    #[must_use]
    pub fn score(&self, signals: &TaskSignals) -> u32 {
        let parts = [
            (signals.file_evidence, self.file_evidence),
            (signals.type_match, self.type_match),
            (signals.tests_recent, self.tests_recent),
            (signals.dev_mode, self.dev_mode),
        ];
        parts
            .iter()
            .filter(|(present, _)| *present)
            .map(|(_, points)| points)
            .sum::<u32>()
            .min(MAX_SCORE)
    }

    #[must_use]
    pub fn is_complete(&self, score: u32) -> bool {
        score >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(file: bool, kind: bool, tests: bool, dev: bool) -> TaskSignals {
        TaskSignals {
            file_evidence: file,
            type_match: kind,
            tests_recent: tests,
            dev_mode: dev,
        }
    }

    #[test]
    fn test_score_is_exact_sum_for_every_combination() {
        let config = ScoringConfig::default();
        for mask in 0u8..16 {
            let s = signals(mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0);
            let expected = [
                (s.file_evidence, 40),
                (s.type_match, 30),
                (s.tests_recent, 20),
                (s.dev_mode, 10),
            ]
            .iter()
            .filter(|(p, _)| *p)
            .map(|(_, w)| *w)
            .sum::<u32>();

            let score = config.score(&s);
            assert_eq!(score, expected, "mask {mask:04b}");
            assert_eq!(config.is_complete(score), expected >= 60, "mask {mask:04b}");
        }
    }

    #[test]
    fn test_threshold_boundaries() {
        let config = ScoringConfig::default();
        // file + tests = 60 -> complete
        assert!(config.is_complete(config.score(&signals(true, false, true, false))));
        // file + dev = 50 -> not complete
        assert!(!config.is_complete(config.score(&signals(true, false, false, true))));
        // file alone = 40
        assert_eq!(config.score(&signals(true, false, false, false)), 40);
    }

    #[test]
    fn test_score_capped_at_max() {
        let config = ScoringConfig {
            file_evidence: 80,
            type_match: 80,
            ..ScoringConfig::default()
        };
        assert_eq!(config.score(&signals(true, true, false, false)), MAX_SCORE);
    }

    #[test]
    fn test_validate() {
        assert!(ScoringConfig::default().validate().is_ok());

        let zero = ScoringConfig {
            threshold: 0,
            ..ScoringConfig::default()
        };
        assert!(zero.validate().is_err());

        let unreachable = ScoringConfig {
            file_evidence: 10,
            type_match: 10,
            tests_recent: 10,
            dev_mode: 10,
            threshold: 60,
        };
        let err = unreachable.validate().unwrap_err();
        assert!(err.contains("unreachable"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ScoringConfig = serde_json::from_str(r#"{"devMode": 25}"#).unwrap();
        assert_eq!(config.dev_mode, 25);
        assert_eq!(config.file_evidence, 40);
        assert_eq!(config.threshold, 60);
    }
}
