#[allow(clippy::module_inception)]
pub mod error;
pub mod cleanup;
pub mod executor;

pub use cleanup::{CleanupError, VolumeError};
pub use error::CliError;
pub use executor::{CatalogueError, RunError};
