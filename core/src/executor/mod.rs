//! Run coordination: sequential execution of a selection with per-task
//! timeouts, cancellation between tasks and free-space measurement.
//!
//! ```text
//! Selection
//!   ↓
//! TaskRegistry::resolve() → canonical order
//!   ↓
//! VolumeProbe (before) → run each task → VolumeProbe (after)
//!   ↓
//! Summary
//! ```

mod engine;
mod progress;
pub mod types;

pub use engine::RunCoordinator;
pub use progress::ProgressMonitor;
pub use types::{Phase, ProgressUpdate, RunOptions, RunState, Summary, TaskOutcome};
