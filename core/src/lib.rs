//! Core of the winsweep maintenance tool: the task catalogue, the cleanup
//! bodies behind it, and the coordinator that runs a selection.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod executor;
pub mod gate;
pub mod task;
pub mod util;
pub mod volume;

pub use config::{AppConfig, SelectionSettings};
pub use error::{CatalogueError, CleanupError, RunError, VolumeError};
pub use executor::{
    ProgressMonitor, ProgressUpdate, RunCoordinator, RunOptions, Summary, TaskOutcome,
};
pub use gate::{ProcessGate, RunningProcess};
pub use task::{Category, Selection, Task, TaskRegistry};
pub use volume::{SystemVolumes, VolumeProbe};
