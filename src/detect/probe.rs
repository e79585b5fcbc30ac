//! Dev server detection.
//!
//! The system probe lists listening sockets with `ss -tuln` and running
//! processes with `ps aux`. A probe that cannot run reports
//! [`ProbeOutcome::Unavailable`] so callers can tell "no dev server" apart
//! from "could not look".

use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::{debug, warn};

/// Ports and process markers that identify a running development setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProbeConfig {
    #[serde(default = "default_frontend_ports")]
    pub frontend_ports: Vec<u16>,
    #[serde(default = "default_backend_ports")]
    pub backend_ports: Vec<u16>,
    /// Substrings of `ps aux` output that mean a dev server is running
    #[serde(default = "default_dev_markers")]
    pub dev_markers: Vec<String>,
}

fn default_frontend_ports() -> Vec<u16> {
    vec![3727]
}

fn default_backend_ports() -> Vec<u16> {
    vec![5455, 5456]
}

fn default_dev_markers() -> Vec<String> {
    vec!["npm run dev".to_string(), "vite".to_string()]
}

impl Default for ServiceProbeConfig {
    fn default() -> Self {
        Self {
            frontend_ports: default_frontend_ports(),
            backend_ports: default_backend_ports(),
            dev_markers: default_dev_markers(),
        }
    }
}

/// What the probe saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceSignals {
    pub frontend_running: bool,
    pub backend_running: bool,
    pub dev_mode: bool,
}

/// Result of probing for dev servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available(ServiceSignals),
    /// The probe could not run; the reason is for logs and reports
    Unavailable(String),
}

impl ProbeOutcome {
    /// Whether a dev server was positively observed.
    #[must_use]
    pub fn dev_mode(&self) -> bool {
        matches!(self, Self::Available(signals) if signals.dev_mode)
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Source of dev server signals.
pub trait ServiceProbe {
    fn probe(&self, config: &ServiceProbeConfig) -> ProbeOutcome;
}

/// Probe backed by the `ss` and `ps` commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl SystemProbe {
    fn run_tool(name: &str, args: &[&str]) -> Result<String, String> {
        let program = which::which(name).map_err(|e| format!("{name} not found: {e}"))?;
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| format!("failed to run {name}: {e}"))?;
        if !output.status.success() {
            return Err(format!("{name} exited with {}", output.status));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ServiceProbe for SystemProbe {
    fn probe(&self, config: &ServiceProbeConfig) -> ProbeOutcome {
        // Dev mode comes from the process list; sockets only add detail.
        let processes = match Self::run_tool("ps", &["aux"]) {
            Ok(out) => out,
            Err(reason) => return ProbeOutcome::Unavailable(reason),
        };
        let sockets = Self::run_tool("ss", &["-tuln"]).unwrap_or_else(|reason| {
            warn!("Socket listing unavailable: {}", reason);
            String::new()
        });

        let signals = signals_from_output(&sockets, &processes, config);
        debug!("Service probe: {:?}", signals);
        ProbeOutcome::Available(signals)
    }
}

/// Interpret socket and process listings.
#[must_use]
pub fn signals_from_output(
    sockets: &str,
    processes: &str,
    config: &ServiceProbeConfig,
) -> ServiceSignals {
    ServiceSignals {
        frontend_running: config
            .frontend_ports
            .iter()
            .any(|port| listens_on(sockets, *port)),
        backend_running: config
            .backend_ports
            .iter()
            .any(|port| listens_on(sockets, *port)),
        dev_mode: config
            .dev_markers
            .iter()
            .any(|marker| processes.contains(marker.as_str())),
    }
}

/// True if `:<port>` appears in the listing and is not part of a longer
/// port number.
#[must_use]
pub fn listens_on(listing: &str, port: u16) -> bool {
    let needle = format!(":{port}");
    listing.match_indices(&needle).any(|(idx, _)| {
        listing[idx + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_digit())
    })
}
