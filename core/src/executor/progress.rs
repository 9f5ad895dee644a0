use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::util::format_bytes;

use super::types::{Summary, TaskOutcome};

/// Visual progress monitor for a cleanup run
///
/// One bar for the whole run; the message shows the current task label.
pub struct ProgressMonitor {
    bar: ProgressBar,
    /// Label of the task currently running
    current: Option<String>,
    /// Whether monitoring is enabled
    enabled: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_tasks` - Number of tasks in the run
    /// * `enabled` - Whether to draw anything (off for non-terminals and `--no-progress`)
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
                current: None,
                enabled: false,
            };
        }

        let bar = ProgressBar::new(total_tasks as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        bar.set_style(style);
        bar.set_message("Initializing...");
        bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            bar,
            current: None,
            enabled: true,
        }
    }

    pub fn start_task(&mut self, label: &str) {
        self.current = Some(label.to_string());
        if self.enabled {
            self.bar.set_message(label.to_string());
        }
    }

    pub fn finish_task(&mut self, outcome: TaskOutcome) {
        let label = self.current.take();
        if !self.enabled {
            return;
        }
        if outcome == TaskOutcome::TimedOut {
            if let Some(label) = label {
                self.bar
                    .println(format!("  timed out: {}", label.trim_end_matches("...")));
            }
        }
        self.bar.inc(1);
    }

    /// Finish overall progress
    pub fn finish(&self, summary: &Summary) {
        if !self.enabled {
            return;
        }
        let msg = if summary.cancelled {
            "Cancelled".to_string()
        } else {
            format!("Done, {} reclaimed", format_bytes(summary.space_reclaimed))
        };
        self.bar.finish_with_message(msg);
    }

    /// Clear all progress indicators (cleanup)
    pub fn clear(&self) {
        if self.enabled {
            self.bar.finish_and_clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if self.enabled && !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
