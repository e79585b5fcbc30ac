//! Test doubles for external dependencies.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::detect::{ProbeOutcome, ServiceProbe, ServiceProbeConfig, ServiceSignals};

/// Service probe returning a fixed outcome.
///
/// # Example
///
/// ```rust,ignore
/// let probe = MockServiceProbe::dev_server_running();
/// assert!(probe.probe(&ServiceProbeConfig::default()).dev_mode());
/// ```
#[derive(Debug)]
pub struct MockServiceProbe {
    outcome: ProbeOutcome,
    calls: AtomicU32,
}

impl MockServiceProbe {
    /// Probe that sees the given signals.
    #[must_use]
    pub fn with_signals(signals: ServiceSignals) -> Self {
        Self {
            outcome: ProbeOutcome::Available(signals),
            calls: AtomicU32::new(0),
        }
    }

    /// Nothing listening, no dev process.
    #[must_use]
    pub fn idle() -> Self {
        Self::with_signals(ServiceSignals::default())
    }

    /// Frontend dev server up on its port.
    #[must_use]
    pub fn dev_server_running() -> Self {
        Self::with_signals(ServiceSignals {
            frontend_running: true,
            backend_running: false,
            dev_mode: true,
        })
    }

    /// Probe that could not run.
    #[must_use]
    pub fn unavailable(reason: &str) -> Self {
        Self {
            outcome: ProbeOutcome::Unavailable(reason.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of times `probe` was called.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ServiceProbe for MockServiceProbe {
    fn probe(&self, _config: &ServiceProbeConfig) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
