//! Per-task execution scope. Background work started by a task body (blocking
//! filesystem jobs, deferred service restarts) is tracked here so the
//! coordinator can stop it and wait for it before the next task starts.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

tokio::task_local! {
    static CURRENT: TaskScope;
}

#[derive(Clone, Debug, Default)]
pub struct TaskScope {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope of the task body currently being polled, if any.
    pub fn current() -> Option<TaskScope> {
        CURRENT.try_with(Clone::clone).ok()
    }

    /// Poll `fut` with this scope installed as the current one.
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        CURRENT.scope(self.clone(), fut).await
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn spawn_blocking<F, T>(&self, job: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.tracker.spawn_blocking(job)
    }

    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(fut)
    }

    /// Wait for every job started in this scope.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Ask outstanding jobs to stop, then wait for them.
    pub async fn abandon(&self) {
        self.cancel.cancel();
        self.drain().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_current_only_inside_run() {
        assert!(TaskScope::current().is_none());
        let scope = TaskScope::new();
        let seen = scope.run(async { TaskScope::current().is_some() }).await;
        assert!(seen);
    }

    #[tokio::test]
    async fn test_abandon_stops_and_waits_for_blocking_jobs() {
        let scope = TaskScope::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let cancel = scope.cancel_token().clone();
        let job_log = log.clone();
        scope.spawn_blocking(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !cancel.is_cancelled() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
            job_log.lock().unwrap().push("stopped");
        });

        let started = Instant::now();
        scope.abandon().await;

        assert_eq!(*log.lock().unwrap(), vec!["stopped"]);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
