use std::path::PathBuf;

use thiserror::Error;

/// Failure inside a cleanup body. Constructed and discarded inside the action;
/// it never crosses the `CleanupAction` boundary.
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Tool { program: String, status: String },

    #[error("registry error: {0}")]
    Registry(String),

    #[error("shell call failed: {0}")]
    Shell(String),

    #[error("invalid glob pattern: {0}")]
    Pattern(String),

    #[error("not supported on this platform: {0}")]
    Unsupported(&'static str),

    #[error("location unavailable: {0}")]
    MissingLocation(&'static str),

    #[error("background job failed: {0}")]
    Join(String),
}

impl CleanupError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the free-space accessor.
#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("no mounted volume contains {}", .0.display())]
    NotFound(PathBuf),

    #[error("volume query failed: {0}")]
    Query(String),
}
