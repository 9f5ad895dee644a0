pub mod config;
pub mod event;
pub mod result;

pub use config::*;
pub use event::*;
pub use result::*;
