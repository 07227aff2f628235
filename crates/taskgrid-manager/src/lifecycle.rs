//! Lifecycle reconciliation and the kill path.
//!
//! State and status reports come from outside (the tasks themselves and
//! the resource manager) and may name tasks the roster no longer holds;
//! those are logged and dropped. Killing is the only way a task leaves
//! the roster.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use taskgrid_core::{TaskState, TaskStatus, TaskStatusEvent};
use taskgrid_roster::{Task, Tasks};

use crate::error::{ManagerError, ManagerResult};
use crate::manager::Manager;

/// Terminates a running task through the resource manager.
#[async_trait]
pub trait TaskKiller: Send + Sync {
    async fn kill(&self, task: &Task) -> anyhow::Result<()>;
}

/// What a kill operation did to the roster.
#[derive(Debug, Clone, Default)]
pub struct KillOutcome {
    /// Active tasks that were killed and removed.
    pub killed: Tasks,
    /// Inactive tasks that were removed without a kill.
    pub removed: Tasks,
    /// The roster after the operation.
    pub running: Tasks,
}

impl Manager {
    /// Record a state reported by a task and forward it to its role.
    pub async fn update_task_state(&self, task_id: &str, state_name: &str) {
        let roster = self.roster.read().await;
        let Some(task) = roster.get_by_task_id(task_id) else {
            warn!(%task_id, state = %state_name, "state update for unknown task");
            return;
        };

        let state = TaskState::from_name(state_name);
        task.set_state(state);
        debug!(%task_id, %state, "task state updated");

        if let Some(role) = task.parent() {
            role.update_state(state);
        }
    }

    /// Record a liveness report from the resource manager and forward it
    /// to the task's role.
    pub async fn update_task_status(&self, event: &TaskStatusEvent) {
        let roster = self.roster.read().await;
        let Some(task) = roster.get_by_task_id(&event.task_id) else {
            warn!(task_id = %event.task_id, kind = ?event.kind, "status update for unknown task");
            return;
        };

        let Some(status) = event.kind.liveness() else {
            debug!(task_id = %event.task_id, kind = ?event.kind, "status update ignored");
            return;
        };
        task.set_status(status);
        debug!(task_id = %event.task_id, %status, "task status updated");

        if let Some(role) = task.parent() {
            role.update_status(status);
        }
    }

    /// Kill every task not locked in an environment.
    pub async fn cleanup(&self) -> ManagerResult<KillOutcome> {
        let mut roster = self.roster.write().await;
        let to_kill = roster.filtered(|t| !t.is_locked());
        self.kill_from_roster(&mut roster, to_kill).await
    }

    /// Kill the given tasks. Every id must name an unlocked roster task,
    /// otherwise nothing is killed.
    pub async fn kill_tasks(&self, task_ids: &[String]) -> ManagerResult<KillOutcome> {
        let mut roster = self.roster.write().await;

        let wanted: HashSet<&str> = task_ids.iter().map(String::as_str).collect();
        let to_kill = roster.filtered(|t| !t.is_locked() && wanted.contains(t.id()));

        if to_kill.len() < wanted.len() {
            let mut missing: Vec<String> = wanted
                .iter()
                .filter(|id| !to_kill.contains(id))
                .map(|id| id.to_string())
                .collect();
            missing.sort();
            return Err(ManagerError::TasksNotFound { task_ids: missing });
        }

        self.kill_from_roster(&mut roster, to_kill).await
    }

    /// `to_kill` must only hold unlocked tasks.
    async fn kill_from_roster(&self, roster: &mut Tasks, to_kill: Tasks) -> ManagerResult<KillOutcome> {
        let removed = to_kill.filtered(|t| t.status() != TaskStatus::Active);
        roster.retain(|t| !removed.contains(t.id()));

        let mut killed = Tasks::new();
        let mut failed = Vec::new();
        for task in to_kill.filtered(|t| t.status() == TaskStatus::Active) {
            match self.killer.kill(&task).await {
                Ok(()) => killed.push(task),
                Err(err) => {
                    error!(task_id = %task.id(), error = %err, "could not kill task");
                    failed.push(task.id().to_string());
                }
            }
        }
        roster.retain(|t| !killed.contains(t.id()));

        info!(
            killed = killed.len(),
            removed = removed.len(),
            failed = failed.len(),
            remaining = roster.len(),
            "tasks killed"
        );

        if !failed.is_empty() {
            return Err(ManagerError::KillFailed {
                killed: killed.ids(),
                failed,
            });
        }

        Ok(KillOutcome {
            killed,
            removed,
            running: roster.clone(),
        })
    }
}
