//! ClassRegistry — the live set of task classes.
//!
//! Tasks never embed their class. They keep the class name and resolve it
//! through a [`ClassLookup`] on demand, so a refresh is visible to every
//! existing task as soon as it lands.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::class::TaskClass;
use crate::error::ClassResult;
use crate::identifier::{ClassIdentifier, canonical_name};
use crate::loader::ClassLoader;

/// Resolves a class name to the current class definition.
pub trait ClassLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Arc<TaskClass>>;
}

/// Outcome of a [`ClassRegistry::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Classes that were not registered before.
    pub loaded: usize,
    /// Registered classes whose definition was replaced.
    pub updated: usize,
    /// Unreferenced classes dropped before loading.
    pub pruned: usize,
}

/// Thread-safe class registry, cheap to clone.
///
/// An empty registry is a valid initial state.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: Arc<RwLock<HashMap<String, Arc<TaskClass>>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a class by name. Absence is a normal outcome.
    pub fn get(&self, name: &str) -> Option<Arc<TaskClass>> {
        self.classes.read().get(&canonical_name(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(&canonical_name(name))
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Registered class keys, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Insert or replace a single class.
    pub fn insert(&self, class: TaskClass) -> Option<Arc<TaskClass>> {
        self.classes.write().insert(class.key(), Arc::new(class))
    }

    /// Load the named classes, replacing existing entries and adding new ones.
    ///
    /// Every definition is loaded and parsed before the registry is touched:
    /// if any of them fails, the call returns the error and the registry is
    /// unchanged. Otherwise classes for which `is_referenced` returns false
    /// are pruned first, then the loaded classes are written.
    pub fn refresh<F>(
        &self,
        required: &[String],
        loader: &dyn ClassLoader,
        is_referenced: F,
    ) -> ClassResult<RefreshSummary>
    where
        F: Fn(&str) -> bool,
    {
        let mut loaded = Vec::with_capacity(required.len());
        for name in required {
            let id = ClassIdentifier::parse(name)?;
            let text = loader.load(&id)?;
            loaded.push(TaskClass::from_yaml(id, &text)?);
        }

        let mut classes = self.classes.write();

        let before = classes.len();
        classes.retain(|key, _| is_referenced(key.as_str()));
        let mut summary = RefreshSummary {
            pruned: before - classes.len(),
            ..RefreshSummary::default()
        };

        for class in loaded {
            let key = class.key();
            match classes.insert(key.clone(), Arc::new(class)) {
                Some(_) => {
                    summary.updated += 1;
                    debug!(class = %key, "class updated");
                }
                None => {
                    summary.loaded += 1;
                    debug!(class = %key, "class added");
                }
            }
        }

        info!(
            loaded = summary.loaded,
            updated = summary.updated,
            pruned = summary.pruned,
            total = classes.len(),
            "classes refreshed"
        );
        Ok(summary)
    }

    /// Drop every unreferenced class that comes from the repository at
    /// `repo_path`. Returns the number of classes removed.
    pub fn remove_repo_classes<F>(&self, repo_path: &str, is_referenced: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let prefix = if repo_path.ends_with('/') {
            repo_path.to_string()
        } else {
            format!("{repo_path}/")
        };

        let mut classes = self.classes.write();
        let before = classes.len();
        classes.retain(|key, _| !key.starts_with(&prefix) || is_referenced(key.as_str()));
        let removed = before - classes.len();

        info!(repo = %prefix, removed, "repository classes removed");
        removed
    }
}

impl ClassLookup for ClassRegistry {
    fn lookup(&self, name: &str) -> Option<Arc<TaskClass>> {
        self.get(name)
    }
}
