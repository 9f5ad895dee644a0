use serde::Serialize;

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Tasks that ran to completion or were abandoned on timeout.
    pub tasks_completed: usize,

    /// Bytes of free space gained on the measured volume.
    pub space_reclaimed: u64,

    /// The run stopped before every selected task started.
    pub cancelled: bool,

    /// Ids of tasks abandoned on timeout, in run order.
    pub timed_out: Vec<String>,

    pub duration_ms: u64,
}
