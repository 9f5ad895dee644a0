//! Command handlers: catalogue listing, saved-selection edits and the run flow.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use winsweep_core::config::{AppConfig, SelectionSettings};
use winsweep_core::error::CliError;
use winsweep_core::executor::{
    Phase, ProgressMonitor, ProgressUpdate, RunCoordinator, RunOptions, Summary,
};
use winsweep_core::gate::ProcessGate;
use winsweep_core::task::{Category, Selection, TaskRegistry};
use winsweep_core::util::format_bytes;
use winsweep_core::volume::SystemVolumes;

use crate::commands::cli::{ListArgs, RunArgs, SelectArgs};
use crate::prompt::{close_apps_question, confirm, CONFIRM_RUN};
use crate::selection::{apply_select, build_selection};

pub const EMPTY_SELECTION: &str = "Select at least one cleanup option.";

/// Exit code when Ctrl-C stopped the run early.
const EXIT_CANCELLED: i32 = 130;

/// Everything a command needs: loaded config, the catalogue and the
/// directory holding saved state.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    registry: Arc<TaskRegistry>,
    data_dir: PathBuf,
}

impl AppContext {
    pub fn new(cfg: AppConfig, registry: TaskRegistry, data_dir: PathBuf) -> Self {
        Self {
            cfg,
            registry: Arc::new(registry),
            data_dir,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    fn settings(&self) -> SelectionSettings {
        SelectionSettings::load(&self.data_dir, &self.registry)
    }
}

pub fn list(ctx: &AppContext, args: &ListArgs) -> Result<i32, CliError> {
    let settings = ctx.settings();
    let categories: Vec<Category> = match args.category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };
    for category in categories {
        println!("{category}");
        for task in ctx.registry().by_category(category) {
            let mark = if settings.is_enabled(&task.id) { 'x' } else { ' ' };
            println!("  [{mark}] {:<26} {}", task.id, task.title);
        }
        println!();
    }
    Ok(0)
}

pub fn select(ctx: &AppContext, args: &SelectArgs) -> Result<i32, CliError> {
    let mut settings = ctx.settings();
    apply_select(&mut settings, args)?;
    if !settings.save(&ctx.data_dir) {
        return Err(CliError::Command(format!(
            "failed to save {}",
            SelectionSettings::path(&ctx.data_dir).display()
        )));
    }
    let selection = settings.selection();
    println!("{} of {} tasks selected", selection.len(), ctx.registry().len());
    for task in ctx.registry().all().iter().filter(|t| selection.contains(&t.id)) {
        println!("  {}", task.id);
    }
    Ok(0)
}

#[tracing::instrument(name = "cli.run", skip_all)]
pub async fn run(ctx: &AppContext, args: &RunArgs) -> Result<i32, CliError> {
    let mut settings = ctx.settings();
    let selection = build_selection(ctx.registry(), &settings, args)?;
    if selection.is_empty() {
        eprintln!("{EMPTY_SELECTION}");
        return Ok(winsweep_core::error::RunError::NoTasksSelected.exit_code());
    }

    if args.save {
        settings.replace_with(&selection)?;
        settings.save(&ctx.data_dir);
    }

    let tasks = ctx.registry().resolve(&selection)?;
    println!("Selected {} task(s):", tasks.len());
    for task in &tasks {
        println!("  - {}", task.title);
    }
    if !confirm(CONFIRM_RUN, args.yes)? {
        println!("Nothing was changed.");
        return Ok(0);
    }

    if tasks.iter().any(|t| t.locks_app_data) {
        close_locking_apps(ctx, args).await?;
    }

    let mut opts = RunOptions::from_config(&ctx.cfg().run);
    if let Some(secs) = args.timeout {
        opts.task_timeout = Duration::from_secs(secs);
    }
    let progress_enabled =
        ctx.cfg().run.progress_bar && !args.no_progress && atty::is(atty::Stream::Stderr);

    let summary = drive(ctx, selection, opts, progress_enabled).await?;
    for line in summary_lines(&summary, ctx.registry()) {
        println!("{line}");
    }
    Ok(if summary.cancelled { EXIT_CANCELLED } else { 0 })
}

/// Offer to close applications holding browser profiles. The run goes ahead
/// whatever the outcome.
async fn close_locking_apps(ctx: &AppContext, args: &RunArgs) -> Result<(), CliError> {
    let gate_cfg = &ctx.cfg().process_gate;
    if !gate_cfg.enabled || args.keep_apps {
        return Ok(());
    }
    let gate = ProcessGate::from_config(gate_cfg);
    let running = gate.running();
    if running.is_empty() {
        return Ok(());
    }
    let mut names: Vec<String> = running.iter().map(|p| p.name.clone()).collect();
    names.dedup();
    if !confirm(&close_apps_question(&names), args.yes)? {
        tracing::info!(apps = ?names, "user kept applications open");
        return Ok(());
    }
    let still_running = gate.close(&running).await;
    if !still_running.is_empty() {
        eprintln!(
            "Still running: {}. Some files may be skipped.",
            still_running.join(", ")
        );
    }
    Ok(())
}

/// Run the coordinator on a background task, draw its progress here, and
/// cancel it on Ctrl-C.
async fn drive(
    ctx: &AppContext,
    selection: Selection,
    opts: RunOptions,
    progress_enabled: bool,
) -> Result<Summary, CliError> {
    let coordinator = RunCoordinator::new(ctx.registry.clone(), Arc::new(SystemVolumes), opts);
    let cancel = CancellationToken::new();
    let total = selection.len();

    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping after the current task");
                cancel.cancel();
            }
        })
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();
    let worker = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            coordinator
                .execute(&selection, &cancel, move |update| {
                    let _ = tx.send(update.clone());
                })
                .await
        })
    };

    let mut monitor = ProgressMonitor::new(total, progress_enabled);
    while let Some(update) = rx.recv().await {
        match update.phase {
            Phase::Starting => {
                if !monitor.is_enabled() {
                    println!("[{}/{}] {}", update.completed + 1, update.total, update.label);
                }
                monitor.start_task(&update.label);
            }
            Phase::Finished(outcome) => monitor.finish_task(outcome),
        }
    }

    let result = worker
        .await
        .map_err(|e| CliError::Command(format!("run task failed: {e}")));
    ctrl_c.abort();

    match result? {
        Ok(summary) => {
            monitor.finish(&summary);
            Ok(summary)
        }
        Err(e) => {
            monitor.clear();
            Err(e.into())
        }
    }
}

pub fn summary_lines(summary: &Summary, registry: &TaskRegistry) -> Vec<String> {
    let mut lines = vec![
        format!("Tasks completed: {}", summary.tasks_completed),
        format!("Space reclaimed: {}", format_bytes(summary.space_reclaimed)),
    ];
    if !summary.timed_out.is_empty() {
        let titles: Vec<&str> = summary
            .timed_out
            .iter()
            .map(|id| registry.get(id).map(|t| t.title.as_str()).unwrap_or(id.as_str()))
            .collect();
        lines.push(format!("Timed out: {}", titles.join(", ")));
    }
    if summary.cancelled {
        lines.push("Cancelled: remaining tasks were skipped.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use winsweep_core::task::{action, Task};

    fn registry() -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        registry
            .register(Task::new(
                "clean-driver-store",
                "Driver store",
                "Cleaning driver store...",
                Category::Advanced,
                action("clean-driver-store", || async { Ok(()) }),
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_summary_lines_plain() {
        let summary = Summary {
            tasks_completed: 3,
            space_reclaimed: 50_000_000,
            ..Summary::default()
        };
        assert_eq!(
            summary_lines(&summary, &registry()),
            vec!["Tasks completed: 3", "Space reclaimed: 47.68 MB"]
        );
    }

    #[test]
    fn test_summary_lines_with_timeouts_and_cancel() {
        let summary = Summary {
            tasks_completed: 1,
            space_reclaimed: 0,
            cancelled: true,
            timed_out: vec!["clean-driver-store".to_string(), "gone".to_string()],
            duration_ms: 10,
        };
        assert_eq!(
            summary_lines(&summary, &registry()),
            vec![
                "Tasks completed: 1",
                "Space reclaimed: 0 B",
                "Timed out: Driver store, gone",
                "Cancelled: remaining tasks were skipped.",
            ]
        );
    }
}
