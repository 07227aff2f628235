//! Manager error types.

use std::fmt;

use thiserror::Error;

use taskgrid_class::ClassError;
use taskgrid_core::{EnvironmentId, TaskId};
use taskgrid_roster::TaskError;

use crate::command::TransportError;

/// Result type alias for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors returned by [`crate::Manager`] operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("tasks not found or locked: {}", .task_ids.join(", "))]
    TasksNotFound { task_ids: Vec<TaskId> },

    #[error("task {task_id} is locked by environment {env_id}")]
    Locked { task_id: TaskId, env_id: EnvironmentId },

    #[error("task {task_id} is already released")]
    AlreadyReleased { task_id: TaskId },

    #[error("task {task_id} is not owned by environment {env_id}")]
    NotOwned { task_id: TaskId, env_id: EnvironmentId },

    #[error("deployment incomplete, tasks left uncommitted: {}", .task_ids.join(", "))]
    PartialDeployment { task_ids: Vec<TaskId> },

    #[error("rendezvous with offer source failed: {0}")]
    Rendezvous(#[from] RendezvousError),

    #[error("transition failed: {0}")]
    TransitionFailed(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not kill tasks: {}", .failed.join(", "))]
    KillFailed { killed: Vec<TaskId>, failed: Vec<TaskId> },

    #[error("class error: {0}")]
    Class(#[from] ClassError),

    #[error("task error: {0}")]
    Task(#[from] TaskError),
}

/// A suspension point of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReviveRequest,
    ReviveAck,
    DeployRequest,
    DeployResult,
    CommandResponse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ReviveRequest => "revive request",
            Stage::ReviveAck => "revive acknowledgement",
            Stage::DeployRequest => "deploy request",
            Stage::DeployResult => "deployment result",
            Stage::CommandResponse => "command response",
        })
    }
}

/// Why a wait on a collaborator ended without an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RendezvousError {
    #[error("{0} cancelled")]
    Cancelled(Stage),

    #[error("{0} timed out")]
    TimedOut(Stage),

    #[error("{0} channel closed")]
    Closed(Stage),
}
