//! Acquisition and release of tasks on behalf of an environment.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use taskgrid_core::EnvironmentId;
use taskgrid_placement::match_descriptors;
use taskgrid_roster::{DeploymentMap, Descriptor, Task, Tasks};

use crate::error::{ManagerError, ManagerResult, RendezvousError};
use crate::manager::Manager;
use crate::rendezvous::PendingDeployment;

impl Manager {
    /// Provide a task for every descriptor, locking them to their roles.
    ///
    /// Idle roster tasks are claimed first. Whatever is left is deployed
    /// through a single revive/deploy round trip with the offer source.
    /// Every deployed task is added to the roster, even when the
    /// deployment comes up short. Ownership is only committed when all
    /// descriptors are satisfied and every new task ends up locked;
    /// otherwise no task of the batch is left owned and the error lists
    /// the uncommitted task ids.
    ///
    /// When the wait for the deployment result times out or is cancelled,
    /// whatever the offer source realizes afterwards still lands on the
    /// roster, unlocked.
    pub async fn acquire_tasks(
        &self,
        env_id: EnvironmentId,
        descriptors: Vec<Descriptor>,
    ) -> ManagerResult<()> {
        let mut roster = self.roster.write().await;

        let plan = match_descriptors(&descriptors, &roster, &self.classes, self.agents.as_ref());
        let mut success = true;

        let mut deployed = DeploymentMap::new();
        if !plan.fully_matched() {
            self.offers
                .revive(self.config.revive_timeout(), &self.cancel)
                .await?;
            let mut pending = self
                .offers
                .deploy(plan.to_deploy.clone(), self.config.deploy_timeout(), &self.cancel)
                .await?;
            let outcome = pending.result(self.config.deploy_timeout(), &self.cancel).await;
            deployed = match outcome {
                Ok(deployed) => deployed,
                Err(err @ RendezvousError::Closed(_)) => return Err(err.into()),
                Err(err) => {
                    warn!(%env_id, error = %err, "gave up on deployment result, late tasks will be adopted");
                    tokio::spawn(adopt_late_deployment(self.roster.clone(), pending));
                    return Err(err.into());
                }
            };
            debug!(%env_id, requested = plan.to_deploy.len(), deployed = deployed.len(), "new tasks running");

            if deployed.len() != plan.to_deploy.len() {
                warn!(
                    %env_id,
                    requested = plan.to_deploy.len(),
                    deployed = deployed.len(),
                    "deployment came up short"
                );
                success = false;
            }
        }

        if success {
            for (task, descriptor) in deployed.iter() {
                task.set_parent(Some(descriptor.task_role.clone()));
                if !task.is_locked() {
                    warn!(task_id = %task.id(), role = %descriptor.task_role.path(), "cannot lock newly deployed task");
                    success = false;
                }
            }
        }

        let mut uncommitted = Vec::new();
        if !success {
            for (task, _) in deployed.iter() {
                task.set_parent(None);
                uncommitted.push(task.id().to_string());
            }
            warn!(%env_id, tasks = uncommitted.len(), "acquisition rolled back, deployed tasks stay unlocked");
        }

        for (task, _) in deployed.iter() {
            if roster.contains(task.id()) {
                warn!(task_id = %task.id(), "deployed task already on roster");
                continue;
            }
            roster.push(task.clone());
        }

        if !success {
            return Err(ManagerError::PartialDeployment {
                task_ids: uncommitted,
            });
        }

        for (task, descriptor) in deployed.iter() {
            descriptor.task_role.set_task(task.clone());
        }
        for (task, descriptor) in plan.already_running.iter() {
            task.set_parent(Some(descriptor.task_role.clone()));
            descriptor.task_role.set_task(task.clone());
        }

        info!(
            %env_id,
            reused = plan.already_running.len(),
            deployed = deployed.len(),
            roster = roster.len(),
            "tasks acquired"
        );
        Ok(())
    }

    /// Clear the ownership of `tasks` held by `env_id`.
    ///
    /// Tasks that are already unlocked are skipped. A task locked by another
    /// environment aborts the batch; tasks released before it stay released.
    pub async fn release_tasks(&self, env_id: EnvironmentId, tasks: &Tasks) -> ManagerResult<()> {
        let _roster = self.roster.write().await;

        for task in tasks {
            match release_task(env_id, task) {
                Ok(()) => debug!(task_id = %task.id(), %env_id, "task released"),
                Err(ManagerError::AlreadyReleased { task_id }) => {
                    debug!(%task_id, "task already released");
                }
                Err(err) => return Err(err),
            }
        }

        info!(%env_id, tasks = tasks.len(), "tasks released");
        Ok(())
    }
}

/// Put tasks realized after the acquisition stopped waiting onto the
/// roster. Nobody owns them; a cleanup can reclaim them.
async fn adopt_late_deployment(roster: Arc<RwLock<Tasks>>, pending: PendingDeployment) {
    let Some(deployed) = pending.late().await else {
        debug!("late deployment dropped by offer source");
        return;
    };

    let mut roster = roster.write().await;
    let mut adopted = 0;
    for (task, _) in deployed.iter() {
        task.set_parent(None);
        if roster.contains(task.id()) {
            continue;
        }
        roster.push(task.clone());
        adopted += 1;
    }
    warn!(adopted, roster = roster.len(), "adopted tasks from a late deployment");
}

fn release_task(env_id: EnvironmentId, task: &Task) -> ManagerResult<()> {
    match task.environment_id() {
        None => {
            // A role outside any environment may still hold the task.
            task.set_parent(None);
            Err(ManagerError::AlreadyReleased {
                task_id: task.id().to_string(),
            })
        }
        Some(owner) if owner != env_id => Err(ManagerError::Locked {
            task_id: task.id().to_string(),
            env_id: owner,
        }),
        Some(_) => {
            task.set_parent(None);
            Ok(())
        }
    }
}
