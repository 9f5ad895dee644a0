use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use winsweep_cli::app::{self, AppContext};
use winsweep_cli::commands::cli;
use winsweep_core::error;
use winsweep_core::task::catalogue;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = cli::Args::parse();
    let cfg = winsweep_core::config::load_default()
        .map_err(|e| error::CliError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(error::CliError::Command)?;

    let data_dir = winsweep_core::config::get_winsweep_data_dir()
        .map_err(|e| error::CliError::Config(e.to_string()))?;
    let registry = catalogue::builtin()?;
    tracing::debug!(data_dir = %data_dir.display(), "winsweep starting");

    let ctx = AppContext::new(cfg, registry, data_dir);

    match args.command {
        Some(cmd) => dispatch(cmd, &ctx).await,
        None => app::list(&ctx, &cli::ListArgs::default()),
    }
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0: success
    // 2: nothing selected
    // 11: config / catalogue error
    // 20: volume measurement or IO error
    // 40: confirmation could not be asked
    // 50: internal/uncategorized
    match e {
        error::CliError::Run(re) => re.exit_code(),
        error::CliError::Catalogue(_) => 11,
        error::CliError::Config(_) => 11,
        error::CliError::Io(_) => 20,
        error::CliError::Command(_) => 20,
        error::CliError::Prompt(_) => 40,
        error::CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(cmd: cli::Commands, ctx: &AppContext) -> Result<i32, error::CliError> {
    match cmd {
        cli::Commands::List(list_args) => app::list(ctx, &list_args),
        cli::Commands::Select(select_args) => app::select(ctx, &select_args),
        cli::Commands::Run(run_args) => app::run(ctx, &run_args).await,
    }
}

fn init_tracing(logging: &winsweep_core::config::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("winsweep"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("winsweep.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
