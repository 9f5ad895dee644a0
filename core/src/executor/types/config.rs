use std::path::PathBuf;
use std::time::Duration;

use crate::config::RunConfig;
use crate::volume::default_volume_root;

/// Run options for the coordinator.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound for a single task; expiry abandons the task.
    pub task_timeout: Duration,

    /// Volume whose free space is compared before and after the run.
    pub volume_root: PathBuf,
}

impl RunOptions {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            task_timeout: Duration::from_secs(cfg.task_timeout_secs.max(1)),
            volume_root: cfg
                .volume_root
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_volume_root),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}
