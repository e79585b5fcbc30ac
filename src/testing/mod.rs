//! Testing infrastructure for planmark.
//!
//! - **Mocks**: service probes with fixed answers, so detection runs never
//!   shell out to `ps` or `ss`
//! - **Fixtures**: temporary project trees with plan, todo and source files
//!   (test-only)
//!
//! # Example
//!
//! ```rust,ignore
//! use planmark::testing::{MockServiceProbe, TestFixture};
//!
//! let fixture = TestFixture::hr_project();
//! let outcome = ProgressDetector::new(fixture.path(), ProjectConfig::default())
//!     .with_probe(MockServiceProbe::dev_server_running())
//!     .run(false)?;
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod mocks;

#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
