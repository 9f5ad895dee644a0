//! Task catalogue: data-described cleanup tasks and the registry that holds
//! them in canonical order.

pub mod catalogue;
mod registry;
mod scope;
mod types;

pub use registry::TaskRegistry;
pub use scope::TaskScope;
pub use types::{action, BestEffort, Category, CleanupAction, Selection, Task};
