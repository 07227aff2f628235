//! Requests for tasks and the result of deploying them.

use std::fmt;
use std::sync::Arc;

use taskgrid_class::canonical_name;
use taskgrid_core::Constraints;

use crate::task::{ParentRole, Task};
use crate::tasks::Tasks;

/// A request for one task of a given class on behalf of a role.
#[derive(Clone)]
pub struct Descriptor {
    pub task_role: Arc<dyn ParentRole>,
    /// Canonical class identifier.
    pub task_class_name: String,
    pub role_constraints: Constraints,
}

impl Descriptor {
    pub fn new(
        task_role: Arc<dyn ParentRole>,
        task_class_name: &str,
        role_constraints: Constraints,
    ) -> Self {
        Self {
            task_role,
            task_class_name: canonical_name(task_class_name),
            role_constraints,
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("role", &self.task_role.path())
            .field("class", &self.task_class_name)
            .field("constraints", &self.role_constraints)
            .finish()
    }
}

/// Tasks paired with the descriptor each was created or claimed for, in
/// the order they were produced.
#[derive(Debug, Clone, Default)]
pub struct DeploymentMap(Vec<(Arc<Task>, Descriptor)>);

impl DeploymentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task: Arc<Task>, descriptor: Descriptor) {
        self.0.push((task, descriptor));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<Task>, &Descriptor)> {
        self.0.iter().map(|(t, d)| (t, d))
    }

    pub fn tasks(&self) -> Tasks {
        self.0.iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.0.iter().map(|(t, _)| t.id().to_string()).collect()
    }
}

impl IntoIterator for DeploymentMap {
    type Item = (Arc<Task>, Descriptor);
    type IntoIter = std::vec::IntoIter<(Arc<Task>, Descriptor)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(Arc<Task>, Descriptor)> for DeploymentMap {
    fn from_iter<I: IntoIterator<Item = (Arc<Task>, Descriptor)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
