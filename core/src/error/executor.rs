use std::path::PathBuf;

use thiserror::Error;

use super::cleanup::VolumeError;

/// Errors raised while building or querying the task catalogue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogueError {
    #[error("duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("task not found: {0}")]
    NotFound(String),
}

/// Boundary failures of a run. Individual task failures never appear here.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("no cleanup tasks selected")]
    NoTasksSelected,

    #[error("failed to read free space on {}: {source}", root.display())]
    Measurement {
        root: PathBuf,
        #[source]
        source: VolumeError,
    },

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
}

impl RunError {
    /// Process exit code reported by the CLI for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoTasksSelected => 2,
            Self::Catalogue(_) => 11,
            Self::Measurement { .. } => 20,
        }
    }
}
