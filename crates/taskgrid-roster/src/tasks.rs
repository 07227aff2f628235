//! Ordered task collections.

use std::sync::Arc;

use crate::error::TaskResult;
use crate::task::{CommandTarget, Task};

/// An ordered list of tasks. The roster itself is a `Tasks` kept in
/// insertion order; filtered views share the same `Arc<Task>` entries.
#[derive(Debug, Clone, Default)]
pub struct Tasks(Vec<Arc<Task>>);

impl Tasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.0.iter()
    }

    pub fn push(&mut self, task: Arc<Task>) {
        self.0.push(task);
    }

    /// Tasks matching `predicate`, in order.
    pub fn filtered<F>(&self, predicate: F) -> Tasks
    where
        F: Fn(&Task) -> bool,
    {
        self.0.iter().filter(|t| predicate(t)).cloned().collect()
    }

    /// Tasks whose class resolves to `class_name`.
    pub fn filtered_for_class(&self, class_name: &str) -> Tasks {
        let key = taskgrid_class::canonical_name(class_name);
        self.filtered(|t| t.class_name() == key)
    }

    pub fn get_by_task_id(&self, id: &str) -> Option<Arc<Task>> {
        self.0.iter().find(|t| t.id() == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|t| t.id() == id)
    }

    /// Keep only the tasks matching `predicate`.
    pub fn retain<F>(&mut self, predicate: F)
    where
        F: Fn(&Task) -> bool,
    {
        self.0.retain(|t| predicate(t));
    }

    pub fn ids(&self) -> Vec<String> {
        self.0.iter().map(|t| t.id().to_string()).collect()
    }

    /// Command targets of every task, failing on the first task without one.
    pub fn command_targets(&self) -> TaskResult<Vec<CommandTarget>> {
        self.0.iter().map(|t| t.command_target()).collect()
    }
}

impl FromIterator<Arc<Task>> for Tasks {
    fn from_iter<I: IntoIterator<Item = Arc<Task>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Arc<Task>> for Tasks {
    fn extend<I: IntoIterator<Item = Arc<Task>>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Tasks {
    type Item = Arc<Task>;
    type IntoIter = std::vec::IntoIter<Arc<Task>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tasks {
    type Item = &'a Arc<Task>;
    type IntoIter = std::slice::Iter<'a, Arc<Task>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Arc<Task>>> for Tasks {
    fn from(tasks: Vec<Arc<Task>>) -> Self {
        Self(tasks)
    }
}
