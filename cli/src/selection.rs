//! Turns command-line flags and the saved state into a `Selection`.

use winsweep_core::config::SelectionSettings;
use winsweep_core::error::CatalogueError;
use winsweep_core::task::{Selection, TaskRegistry};

use crate::commands::cli::{RunArgs, SelectArgs};

/// Selection for `winsweep run`. Without `--task`, `--category` or `--all`
/// the saved selection is used; `--saved` adds it to explicit flags.
pub fn build_selection(
    registry: &TaskRegistry,
    settings: &SelectionSettings,
    args: &RunArgs,
) -> Result<Selection, CatalogueError> {
    let mut selection = Selection::new();

    if args.all {
        for task in registry.all() {
            selection.insert(task.id.clone());
        }
    }
    for id in &args.tasks {
        let task = registry.get(id.trim())?;
        selection.insert(task.id.clone());
    }
    for category in &args.categories {
        for task in registry.by_category(*category) {
            selection.insert(task.id.clone());
        }
    }
    if args.saved || !args.has_explicit_selection() {
        for id in settings.selection().ids() {
            selection.insert(id);
        }
    }
    Ok(selection)
}

/// Apply `winsweep select` flags to the saved state: `--all`/`--none` first,
/// then enables, then disables.
pub fn apply_select(
    settings: &mut SelectionSettings,
    args: &SelectArgs,
) -> Result<(), CatalogueError> {
    if args.all {
        settings.set_all(true);
    }
    if args.none {
        settings.set_all(false);
    }
    for id in &args.enable {
        settings.set(id.trim(), true)?;
    }
    for id in &args.disable {
        settings.set(id.trim(), false)?;
    }
    Ok(())
}
