use serde::Serialize;

/// How a task left the run. Failures inside a task are not observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "outcome", rename_all = "snake_case")]
pub enum Phase {
    Starting,
    Finished(TaskOutcome),
}

/// Progress notification emitted around every task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    #[serde(flatten)]
    pub phase: Phase,
    pub task_id: String,
    pub label: String,
    pub completed: usize,
    pub total: usize,
}

/// Mutable view of a run in progress. Only the coordinator advances it.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub total: usize,
    pub completed: usize,
    pub current_label: Option<String>,
}

impl RunState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub(crate) fn start(&mut self, task_id: &str, label: &str) -> ProgressUpdate {
        self.current_label = Some(label.to_string());
        self.update(Phase::Starting, task_id, label)
    }

    pub(crate) fn finish(
        &mut self,
        task_id: &str,
        label: &str,
        outcome: TaskOutcome,
    ) -> ProgressUpdate {
        self.completed = (self.completed + 1).min(self.total);
        self.current_label = None;
        self.update(Phase::Finished(outcome), task_id, label)
    }

    fn update(&self, phase: Phase, task_id: &str, label: &str) -> ProgressUpdate {
        ProgressUpdate {
            phase,
            task_id: task_id.to_string(),
            label: label.to_string(),
            completed: self.completed,
            total: self.total,
        }
    }
}
