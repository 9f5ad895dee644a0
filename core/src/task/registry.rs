use std::collections::HashMap;

use crate::error::CatalogueError;

use super::types::{Category, Selection, Task};

/// Immutable-after-startup catalogue of cleanup tasks, iterated in
/// declaration order.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task. Ids are unique within the catalogue.
    pub fn register(&mut self, task: Task) -> Result<(), CatalogueError> {
        if self.index.contains_key(&task.id) {
            return Err(CatalogueError::DuplicateTask(task.id));
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Task, CatalogueError> {
        self.index
            .get(id)
            .map(|&i| &self.tasks[i])
            .ok_or_else(|| CatalogueError::NotFound(id.to_string()))
    }

    /// All tasks in canonical order.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.category == category)
    }

    /// Canonical order restricted to `selection`. Every selected id must be
    /// present in the catalogue.
    pub fn resolve(&self, selection: &Selection) -> Result<Vec<&Task>, CatalogueError> {
        if let Some(missing) = selection.ids().find(|id| !self.index.contains_key(*id)) {
            return Err(CatalogueError::NotFound(missing.to_string()));
        }
        Ok(self
            .tasks
            .iter()
            .filter(|t| selection.contains(&t.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::action;

    fn noop(id: &'static str, category: Category) -> Task {
        Task::new(
            id,
            id,
            format!("Running {id}..."),
            category,
            action(id, || async { Ok(()) }),
        )
    }

    fn sample() -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        registry.register(noop("a", Category::QuickCleanup)).unwrap();
        registry.register(noop("b", Category::Logs)).unwrap();
        registry.register(noop("c", Category::Logs)).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = sample();
        let err = registry
            .register(noop("b", Category::Network))
            .unwrap_err();
        assert_eq!(err, CatalogueError::DuplicateTask("b".into()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_get_missing_task() {
        let registry = sample();
        assert_eq!(registry.get("b").unwrap().category, Category::Logs);
        assert_eq!(
            registry.get("zzz").unwrap_err(),
            CatalogueError::NotFound("zzz".into())
        );
    }

    #[test]
    fn test_all_keeps_declaration_order() {
        let registry = sample();
        let ids: Vec<&str> = registry.all().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_resolve_filters_in_canonical_order() {
        let registry = sample();
        let selection: Selection = ["c", "a"].into_iter().collect();
        let ids: Vec<&str> = registry
            .resolve(&selection)
            .unwrap()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let registry = sample();
        let selection: Selection = ["a", "nope"].into_iter().collect();
        assert_eq!(
            registry.resolve(&selection).unwrap_err(),
            CatalogueError::NotFound("nope".into())
        );
    }

    #[test]
    fn test_by_category() {
        let registry = sample();
        assert_eq!(registry.by_category(Category::Logs).count(), 2);
        assert_eq!(registry.by_category(Category::Registry).count(), 0);
    }
}
