//! TaskFactory — builds tasks bound to the live class registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use taskgrid_class::ClassLookup;
use taskgrid_core::Offer;

use crate::descriptor::Descriptor;
use crate::task::Task;

/// Handed to the offer source so it can realize tasks without going
/// through the manager lock.
#[derive(Clone)]
pub struct TaskFactory {
    classes: Arc<dyn ClassLookup>,
}

impl TaskFactory {
    pub fn new(classes: Arc<dyn ClassLookup>) -> Self {
        Self { classes }
    }

    /// Build an unowned task for `descriptor` on the agent behind `offer`.
    ///
    /// Ownership is assigned later, when the acquisition that asked for
    /// the task commits.
    pub fn new_task_for_offer(
        &self,
        offer: &Offer,
        descriptor: &Descriptor,
        bind_ports: BTreeMap<String, u64>,
        executor_id: impl Into<String>,
    ) -> Arc<Task> {
        let task = Task::new(
            &descriptor.task_class_name,
            offer,
            executor_id,
            bind_ports,
            self.classes.clone(),
        );
        debug!(task_id = %task.id(), class = %task.class_name(), host = %task.hostname(), "task created for offer");
        Arc::new(task)
    }
}
