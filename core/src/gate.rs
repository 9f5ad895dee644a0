//! Process-liveness gate: finds applications that hold files a task is about
//! to delete and asks them to close.

use std::collections::BTreeSet;
use std::time::Duration;

use sysinfo::{Pid, System};

use crate::config::ProcessGateConfig;

/// Browsers whose profiles `wipe-browser-data` touches.
pub const DEFAULT_PROCESS_NAMES: &[&str] = &[
    "chrome", "msedge", "brave", "vivaldi", "opera", "arc", "firefox", "waterfox", "palemoon",
];

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningProcess {
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ProcessGate {
    names: BTreeSet<String>,
    wait: Duration,
}

impl ProcessGate {
    pub fn new<I, S>(names: I, wait: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
            wait,
        }
    }

    pub fn from_config(cfg: &ProcessGateConfig) -> Self {
        Self::new(&cfg.process_names, Duration::from_millis(cfg.wait_ms))
    }

    pub fn watches(&self, process_name: &str) -> bool {
        self.names.contains(&normalize_name(process_name))
    }

    /// Watched processes currently running, ordered by name then pid.
    pub fn running(&self) -> Vec<RunningProcess> {
        let mut sys = System::new();
        sys.refresh_processes();
        let mut found: Vec<RunningProcess> = sys
            .processes()
            .iter()
            .filter(|(_, p)| self.watches(p.name()))
            .map(|(pid, p)| RunningProcess {
                pid: pid.as_u32(),
                name: normalize_name(p.name()),
            })
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.pid.cmp(&b.pid)));
        found
    }

    /// Ask each process to close, then wait up to the configured limit for
    /// them to exit. Returns the distinct names still running afterwards.
    pub async fn close(&self, processes: &[RunningProcess]) -> Vec<String> {
        for process in processes {
            request_close(process).await;
        }

        let deadline = tokio::time::Instant::now() + self.wait;
        loop {
            let alive = still_running(processes);
            if alive.is_empty() || tokio::time::Instant::now() >= deadline {
                if !alive.is_empty() {
                    tracing::warn!(still_running = ?alive, "processes did not exit in time");
                }
                return alive;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl Default for ProcessGate {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_NAMES, Duration::from_millis(4000))
    }
}

/// Lowercase with any `.exe` suffix removed.
pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Distinct names among `processes` that are still alive.
fn still_running(processes: &[RunningProcess]) -> Vec<String> {
    let mut sys = System::new();
    sys.refresh_processes();
    let alive: BTreeSet<String> = processes
        .iter()
        .filter(|p| sys.process(Pid::from_u32(p.pid)).is_some())
        .map(|p| p.name.clone())
        .collect();
    alive.into_iter().collect()
}

#[cfg(windows)]
async fn request_close(process: &RunningProcess) {
    let pid = process.pid.to_string();
    // No /F: windows get a close message and may prompt to save.
    if let Err(e) = crate::cleanup::tool::run_tool("taskkill.exe", &["/PID", &pid]).await {
        tracing::debug!(
            pid = process.pid,
            name = %process.name,
            error = %e,
            "close request refused"
        );
    }
}

#[cfg(not(windows))]
async fn request_close(process: &RunningProcess) {
    let mut sys = System::new();
    sys.refresh_processes();
    let sent = sys
        .process(Pid::from_u32(process.pid))
        .and_then(|p| p.kill_with(sysinfo::Signal::Term))
        .unwrap_or(false);
    if !sent {
        tracing::debug!(pid = process.pid, name = %process.name, "close request not delivered");
    }
}
