#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use winsweep_core::cleanup::blocking;
use winsweep_core::error::{CleanupError, VolumeError};
use winsweep_core::task::{action, Category, Task, TaskRegistry};
use winsweep_core::volume::VolumeProbe;

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// How a fake task behaves when run.
#[derive(Clone, Copy)]
pub enum Behaviour {
    Succeed,
    Fail,
    Sleep(Duration),
    /// Blocking-pool job that spins until its task is cancelled, then logs
    /// `<id>-stopped`.
    BlockingUntilCancelled,
    /// Blocking-pool job that ignores cancellation, then logs `<id>-done`.
    BlockingFor(Duration),
}

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A task that records its id in `log` before doing what `behaviour` says.
pub fn recording_task(id: &'static str, behaviour: Behaviour, log: &CallLog) -> Task {
    let log = log.clone();
    Task::new(
        id,
        id,
        format!("Running {id}..."),
        Category::QuickCleanup,
        action(id, move || {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(id.to_string());
                match behaviour {
                    Behaviour::Succeed => Ok(()),
                    Behaviour::Fail => Err(CleanupError::Unsupported("scripted failure")),
                    Behaviour::Sleep(d) => {
                        tokio::time::sleep(d).await;
                        Ok(())
                    }
                    Behaviour::BlockingUntilCancelled => {
                        let log = log.clone();
                        blocking(move |cancel| {
                            let deadline = Instant::now() + Duration::from_secs(10);
                            while !cancel.is_cancelled() && Instant::now() < deadline {
                                std::thread::sleep(Duration::from_millis(5));
                            }
                            log.lock().unwrap().push(format!("{id}-stopped"));
                        })
                        .await
                    }
                    Behaviour::BlockingFor(d) => {
                        let log = log.clone();
                        blocking(move |_| {
                            std::thread::sleep(d);
                            log.lock().unwrap().push(format!("{id}-done"));
                        })
                        .await
                    }
                }
            }
        }),
    )
}

pub fn registry(tasks: &[(&'static str, Behaviour)], log: &CallLog) -> Arc<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    for (id, behaviour) in tasks {
        registry
            .register(recording_task(id, *behaviour, log))
            .unwrap();
    }
    Arc::new(registry)
}

/// Returns queued readings in order and counts how often it was asked.
pub struct ScriptedVolume {
    readings: Mutex<VecDeque<Result<u64, VolumeError>>>,
    calls: AtomicUsize,
}

impl ScriptedVolume {
    pub fn new(readings: Vec<Result<u64, VolumeError>>) -> Arc<Self> {
        Arc::new(Self {
            readings: Mutex::new(readings.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn fixed(before: u64, after: u64) -> Arc<Self> {
        Self::new(vec![Ok(before), Ok(after)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VolumeProbe for ScriptedVolume {
    fn available_bytes(&self, _root: &Path) -> Result<u64, VolumeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.readings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(VolumeError::Query("no reading scripted".to_string())))
    }
}
