//! Task-level error types.

use thiserror::Error;

use taskgrid_core::TaskId;

/// Result type alias for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {task_id} has no command target (agent {agent_id:?}, executor {executor_id:?})")]
    NoCommandTarget {
        task_id: TaskId,
        agent_id: String,
        executor_id: String,
    },

    #[error("class {class} of task {task_id} is not registered")]
    ClassUnavailable { task_id: TaskId, class: String },

    #[error("task {task_id}: outbound channel {channel} targets unknown endpoint {target}")]
    UnresolvedChannel {
        task_id: TaskId,
        channel: String,
        target: String,
    },
}
