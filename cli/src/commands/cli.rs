use clap::{Args as ClapArgs, Parser, Subcommand};
use winsweep_core::task::Category;

#[derive(Parser, Debug)]
#[command(
    name = "winsweep",
    version,
    about = "Clean caches, logs, history and registry leftovers on Windows"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only show one category.
    #[arg(long, value_parser = parse_category)]
    pub category: Option<Category>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Turn a task on in the saved selection. Can be repeated.
    #[arg(long = "enable", value_name = "ID", action = clap::ArgAction::Append)]
    pub enable: Vec<String>,

    /// Turn a task off in the saved selection. Can be repeated.
    #[arg(long = "disable", value_name = "ID", action = clap::ArgAction::Append)]
    pub disable: Vec<String>,

    /// Start from every task on.
    #[arg(long, conflicts_with = "none")]
    pub all: bool,

    /// Start from every task off.
    #[arg(long)]
    pub none: bool,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Run a specific task. Can be repeated.
    #[arg(long = "task", value_name = "ID", action = clap::ArgAction::Append)]
    pub tasks: Vec<String>,

    /// Run every task in a category. Can be repeated.
    #[arg(
        long = "category",
        value_name = "CATEGORY",
        value_parser = parse_category,
        action = clap::ArgAction::Append
    )]
    pub categories: Vec<Category>,

    /// Run the whole catalogue.
    #[arg(long)]
    pub all: bool,

    /// Add the saved selection to `--task`/`--category`. Implied when neither is given.
    #[arg(long)]
    pub saved: bool,

    /// Answer yes to every confirmation.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Do not offer to close running applications.
    #[arg(long)]
    pub keep_apps: bool,

    /// Print task labels instead of drawing a progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Per-task timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Store this run's selection as the saved selection.
    #[arg(long)]
    pub save: bool,
}

impl RunArgs {
    /// True when the selection comes from flags rather than the saved state.
    pub fn has_explicit_selection(&self) -> bool {
        self.all || !self.tasks.is_empty() || !self.categories.is_empty()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the task catalogue and the saved selection.
    List(ListArgs),
    /// Change the saved selection.
    Select(SelectArgs),
    /// Run the selected cleanup tasks.
    Run(RunArgs),
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_slug(s).ok_or_else(|| {
        let known: Vec<&str> = Category::ALL.iter().map(|c| c.slug()).collect();
        format!("unknown category '{s}' (expected one of: {})", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let args = Args::try_parse_from([
            "winsweep",
            "run",
            "--task",
            "flush-dns",
            "--category",
            "logs",
            "--category",
            "network",
            "--yes",
            "--timeout",
            "60",
        ])
        .unwrap();
        let Some(Commands::Run(run)) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.tasks, vec!["flush-dns".to_string()]);
        assert_eq!(run.categories, vec![Category::Logs, Category::Network]);
        assert!(run.yes);
        assert_eq!(run.timeout, Some(60));
        assert!(run.has_explicit_selection());
    }

    #[test]
    fn test_rejects_unknown_category_and_zero_timeout() {
        assert!(Args::try_parse_from(["winsweep", "list", "--category", "disk"]).is_err());
        assert!(Args::try_parse_from(["winsweep", "run", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_select_all_conflicts_with_none() {
        assert!(Args::try_parse_from(["winsweep", "select", "--all", "--none"]).is_err());
    }

    #[test]
    fn test_no_subcommand() {
        let args = Args::try_parse_from(["winsweep"]).unwrap();
        assert!(args.command.is_none());
    }
}
