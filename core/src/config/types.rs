use serde::{Deserialize, Serialize};

use crate::gate::DEFAULT_PROCESS_NAMES;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub process_gate: ProcessGateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "winsweep_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    false
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Upper bound for a single task. DISM and pnputil can legitimately take
    /// several minutes.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Volume whose free space is measured. Unset means the system drive.
    #[serde(default)]
    pub volume_root: Option<String>,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

fn default_task_timeout_secs() -> u64 {
    900
}

fn default_progress_bar() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            task_timeout_secs: default_task_timeout_secs(),
            volume_root: None,
            progress_bar: default_progress_bar(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessGateConfig {
    #[serde(default = "default_gate_enabled")]
    pub enabled: bool,

    /// How long to wait for closed applications to exit.
    #[serde(default = "default_gate_wait_ms")]
    pub wait_ms: u64,

    /// Process names without `.exe`, matched case-insensitively.
    #[serde(default = "default_process_names")]
    pub process_names: Vec<String>,
}

fn default_gate_enabled() -> bool {
    true
}

fn default_gate_wait_ms() -> u64 {
    4000
}

fn default_process_names() -> Vec<String> {
    DEFAULT_PROCESS_NAMES.iter().map(|s| s.to_string()).collect()
}

impl Default for ProcessGateConfig {
    fn default() -> Self {
        Self {
            enabled: default_gate_enabled(),
            wait_ms: default_gate_wait_ms(),
            process_names: default_process_names(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.run.task_timeout_secs, 900);
        assert!(cfg.run.progress_bar);
        assert_eq!(cfg.process_gate.wait_ms, 4000);
        assert_eq!(cfg.process_gate.process_names.len(), DEFAULT_PROCESS_NAMES.len());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [run]
            task_timeout_secs = 60
            volume_root = 'D:\'

            [process_gate]
            enabled = false
            process_names = ["chrome"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.run.task_timeout_secs, 60);
        assert_eq!(cfg.run.volume_root.as_deref(), Some("D:\\"));
        assert!(cfg.run.progress_bar);
        assert!(!cfg.process_gate.enabled);
        assert_eq!(cfg.process_gate.wait_ms, 4000);
        assert_eq!(cfg.process_gate.process_names, vec!["chrome".to_string()]);
    }
}
