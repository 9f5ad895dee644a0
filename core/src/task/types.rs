use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CleanupError;

/// Presentation grouping of tasks. Declaration order is the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    QuickCleanup,
    Privacy,
    SystemMaintenance,
    Logs,
    Network,
    Registry,
    Advanced,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::QuickCleanup,
        Category::Privacy,
        Category::SystemMaintenance,
        Category::Logs,
        Category::Network,
        Category::Registry,
        Category::Advanced,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::QuickCleanup => "quick-cleanup",
            Self::Privacy => "privacy",
            Self::SystemMaintenance => "system-maintenance",
            Self::Logs => "logs",
            Self::Network => "network",
            Self::Registry => "registry",
            Self::Advanced => "advanced",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::QuickCleanup => "Quick Cleanup",
            Self::Privacy => "Privacy & Tracking",
            Self::SystemMaintenance => "System Maintenance",
            Self::Logs => "Logs & Diagnostics",
            Self::Network => "Network",
            Self::Registry => "Registry",
            Self::Advanced => "Advanced",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A cleanup body. There is no error channel: implementations complete
/// eventually and swallow their own failures.
#[async_trait]
pub trait CleanupAction: Send + Sync {
    async fn run(&self);
}

/// Adapts a fallible body into a [`CleanupAction`], logging and discarding
/// whatever error it produces.
pub struct BestEffort<F> {
    task_id: &'static str,
    body: F,
}

impl<F> BestEffort<F> {
    pub fn new(task_id: &'static str, body: F) -> Self {
        Self { task_id, body }
    }
}

#[async_trait]
impl<F, Fut> CleanupAction for BestEffort<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CleanupError>> + Send,
{
    async fn run(&self) {
        if let Err(e) = (self.body)().await {
            tracing::debug!(task = self.task_id, error = %e, "cleanup step failed, ignoring");
        }
    }
}

/// Shorthand used by the catalogue to wrap a fallible body.
pub fn action<F, Fut>(task_id: &'static str, body: F) -> Arc<dyn CleanupAction>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CleanupError>> + Send + 'static,
{
    Arc::new(BestEffort::new(task_id, body))
}

/// One independently selectable cleanup operation.
#[derive(Clone)]
pub struct Task {
    pub id: String,
    /// Short name used in listings, e.g. "User temp files".
    pub title: String,
    /// Progress text shown while the task runs.
    pub label: String,
    pub category: Category,
    /// Touches files owned by live applications (browser profiles).
    pub locks_app_data: bool,
    pub action: Arc<dyn CleanupAction>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        label: impl Into<String>,
        category: Category,
        action: Arc<dyn CleanupAction>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            label: label.into(),
            category,
            locks_app_data: false,
            action,
        }
    }

    pub fn locking_app_data(mut self) -> Self {
        self.locks_app_data = true;
        self
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("category", &self.category)
            .field("locks_app_data", &self.locks_app_data)
            .finish_non_exhaustive()
    }
}

/// Task ids chosen for one run. Iteration order of the set does not affect
/// run order; the registry's canonical order does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_best_effort_swallows_errors() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let failing = action("always-fails", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(CleanupError::Unsupported("test")) }
        });

        tokio_test::block_on(failing.run());
        tokio_test::block_on(failing.run());

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_category_slugs_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_slug(category.slug()), Some(category));
        }
        assert_eq!(Category::from_slug(" Network "), Some(Category::Network));
        assert_eq!(Category::from_slug("disk"), None);
    }

    #[test]
    fn test_selection_dedups_ids() {
        let selection: Selection = ["b", "a", "b"].into_iter().collect();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
