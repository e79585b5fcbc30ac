//! planmark - markdown plan bookkeeping
//!
//! Keeps markdown planning documents current: stamps date fields,
//! detects finished plan tasks from filesystem and process signals, and
//! mirrors checked plan tasks into a master todo list.
//!
//! # Architecture
//!
//! - [`config`] - Project settings (`.planmark/settings.json`) and defaults
//! - [`dates`] - Date formats and the date-field rewriter
//! - [`detect`] - Heuristic completion detection with persisted state
//! - [`error`] - Custom error types and exit codes
//! - [`plan`] - Plan discovery and checkbox scanning
//! - [`sync`] - Plan-to-todo progress synchronization
//! - [`testing`] - Testing infrastructure (mocks, fixtures)
//!
//! # Example
//!
//! ```rust,ignore
//! use planmark::detect::ProgressDetector;
//! use planmark::sync::ProgressSync;
//! use planmark::ProjectConfig;
//!
//! let config = ProjectConfig::load(".")?;
//! let detection = ProgressDetector::new(".", config.clone()).run(false)?;
//! let sync = ProgressSync::new(".", config).run()?;
//! println!("{}\n{}", detection.report, sync.summary);
//! ```

pub mod config;
pub mod dates;
pub mod detect;
pub mod error;
pub mod plan;
pub mod sync;
pub mod testing;

// Re-export commonly used types
pub use error::{PlanmarkError, Result};

pub use config::{FeatureRule, ProjectConfig};
pub use dates::{DateFormat, DateUpdateOutcome};
pub use detect::{DetectionOutcome, ProgressDetector, ProbeOutcome, ServiceProbe};
pub use sync::{ProgressSync, SyncOutcome, TodoUpdate};
