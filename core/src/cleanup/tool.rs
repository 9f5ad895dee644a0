//! External system tools (DISM, wevtutil, sc, ...). Children are spawned
//! without a console window and die with the future that owns them, so a
//! per-task timeout also stops the tool.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::CleanupError;
use crate::task::TaskScope;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

fn command(program: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}

/// Run a tool to completion, discarding its output. A non-zero exit is an error.
pub async fn run_tool(program: &str, args: &[&str]) -> Result<(), CleanupError> {
    tracing::debug!(program, ?args, "running tool");
    let status = command(program, args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| CleanupError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(CleanupError::Tool {
            program: program.to_string(),
            status: status.to_string(),
        })
    }
}

/// Run a tool and capture stdout as (lossy) text.
pub async fn tool_output(program: &str, args: &[&str]) -> Result<String, CleanupError> {
    let output = command(program, args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|source| CleanupError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(CleanupError::Tool {
            program: program.to_string(),
            status: output.status.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Stop a Windows service, run `body`, then start the service again whether or
/// not `body` succeeded. The restart also happens when the task times out
/// while the service is down.
pub async fn with_service_stopped<F, Fut>(
    service: &str,
    settle: Duration,
    body: F,
) -> Result<(), CleanupError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), CleanupError>>,
{
    if let Err(e) = run_tool("sc.exe", &["stop", service]).await {
        tracing::debug!(service, error = %e, "service stop failed");
    }
    let restart = Deferred::new(start_service(service.to_string()));
    tokio::time::sleep(settle).await;
    let result = body().await;
    restart.run_now().await;
    result
}

async fn start_service(service: String) {
    if let Err(e) = run_tool("sc.exe", &["start", &service]).await {
        tracing::debug!(service = %service, error = %e, "service start failed");
    }
}

/// Cleanup work that must run even if the owning future is dropped. Dropped
/// unrun, the work is spawned on the current task scope so the coordinator
/// waits for it before starting the next task.
pub(crate) struct Deferred<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    work: Option<F>,
    scope: Option<TaskScope>,
}

impl<F> Deferred<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    pub(crate) fn new(work: F) -> Self {
        Self {
            work: Some(work),
            scope: TaskScope::current(),
        }
    }

    pub(crate) async fn run_now(mut self) {
        if let Some(work) = self.work.take() {
            work.await;
        }
    }
}

impl<F> Drop for Deferred<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    fn drop(&mut self) {
        let Some(work) = self.work.take() else {
            return;
        };
        tracing::debug!("running deferred cleanup after abandoned task");
        match &self.scope {
            Some(scope) => {
                scope.spawn(work);
            }
            None => {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(work);
                }
            }
        }
    }
}

/// Parse `cmdkey /list` output into credential target names.
pub fn parse_cmdkey_targets(listing: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for line in listing.lines() {
        let trimmed = line.trim();
        let Some(prefix) = trimmed.get(..7) else {
            continue;
        };
        if !prefix.eq_ignore_ascii_case("target:") {
            continue;
        }
        let target = trimmed[7..].trim();
        if !target.is_empty() && !targets.iter().any(|t| t.eq_ignore_ascii_case(target)) {
            targets.push(target.to_string());
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn restart_logger(log: &Arc<Mutex<Vec<&'static str>>>) -> impl Future<Output = ()> + Send {
        let log = log.clone();
        async move { log.lock().unwrap().push("restarted") }
    }

    #[tokio::test]
    async fn test_deferred_runs_once_when_completed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let deferred = Deferred::new(restart_logger(&log));
        deferred.run_now().await;
        tokio::task::yield_now().await;
        assert_eq!(*log.lock().unwrap(), vec!["restarted"]);
    }

    #[tokio::test]
    async fn test_deferred_runs_when_task_is_abandoned() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scope = TaskScope::new();
        let work = restart_logger(&log);
        let body = scope.run(async move {
            let deferred = Deferred::new(work);
            tokio::time::sleep(Duration::from_secs(30)).await;
            deferred.run_now().await;
        });

        assert!(tokio::time::timeout(Duration::from_millis(20), body)
            .await
            .is_err());
        scope.abandon().await;

        assert_eq!(*log.lock().unwrap(), vec!["restarted"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_tool("winsweep-definitely-not-a-tool", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CleanupError::Spawn { .. }));
    }

    #[test]
    fn test_parse_cmdkey_targets() {
        let listing = "\r\nCurrently stored credentials:\r\n\r\n    Target: Domain:target=TERMSRV/host\r\n    Type: Domain Password\r\n    User: me\r\n\r\n    target: LegacyGeneric:target=git:https://example.com\r\n    Target: Domain:target=TERMSRV/HOST\r\n";
        assert_eq!(
            parse_cmdkey_targets(listing),
            vec![
                "Domain:target=TERMSRV/host".to_string(),
                "LegacyGeneric:target=git:https://example.com".to_string(),
            ]
        );
    }
}
