//! winsweep-cli library: command handlers exposed for unit tests.

pub mod app;
pub mod commands;
pub mod prompt;
pub mod selection;
