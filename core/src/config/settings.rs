//! Saved selection: one flag per catalogue task, stored as JSON next to the
//! config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogueError;
use crate::task::{Selection, TaskRegistry};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSettings {
    flags: BTreeMap<String, bool>,
}

impl SelectionSettings {
    /// Every catalogue task, all off.
    pub fn defaults(registry: &TaskRegistry) -> Self {
        Self {
            flags: registry.all().iter().map(|t| (t.id.clone(), false)).collect(),
        }
    }

    pub fn path(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE)
    }

    /// Read saved flags. A missing or unreadable file gives the defaults; ids
    /// the catalogue no longer knows are dropped.
    pub fn load(dir: &Path, registry: &TaskRegistry) -> Self {
        let path = Self::path(dir);
        let stored: BTreeMap<String, bool> = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(flags) => flags,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "settings unreadable, using defaults"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "settings unreadable, using defaults"
                );
                BTreeMap::new()
            }
        };

        let mut settings = Self::defaults(registry);
        for (id, enabled) in stored {
            match settings.flags.get_mut(&id) {
                Some(flag) => *flag = enabled,
                None => tracing::warn!(task = %id, "dropping unknown task from settings"),
            }
        }
        settings
    }

    /// Write the flags. Failures are logged and reported as `false`.
    pub fn save(&self, dir: &Path) -> bool {
        let path = Self::path(dir);
        let result = std::fs::create_dir_all(dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| serde_json::to_string_pretty(self).map_err(anyhow::Error::from))
            .and_then(|json| std::fs::write(&path, json).map_err(anyhow::Error::from));
        match result {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "settings saved");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to save settings");
                false
            }
        }
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.flags.get(id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: &str, enabled: bool) -> Result<(), CatalogueError> {
        let flag = self
            .flags
            .get_mut(id)
            .ok_or_else(|| CatalogueError::NotFound(id.to_string()))?;
        *flag = enabled;
        Ok(())
    }

    pub fn set_all(&mut self, enabled: bool) {
        self.flags.values_mut().for_each(|f| *f = enabled);
    }

    /// Replace the flags with exactly the tasks in `selection`.
    pub fn replace_with(&mut self, selection: &Selection) -> Result<(), CatalogueError> {
        if let Some(id) = selection.ids().find(|id| !self.flags.contains_key(*id)) {
            return Err(CatalogueError::NotFound(id.to_string()));
        }
        for (id, flag) in self.flags.iter_mut() {
            *flag = selection.contains(id);
        }
        Ok(())
    }

    pub fn selection(&self) -> Selection {
        self.flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
