use thiserror::Error;

use super::executor::{CatalogueError, RunError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("run failed: {0}")]
    Run(#[from] RunError),
    #[error("catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),
    #[error("config error: {0}")]
    Config(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("prompt failed: {0}")]
    Prompt(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
