//! Configuration and state-machine transitions of running tasks.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use taskgrid_core::{BindMap, Endpoint, EnvironmentId, PropertyMap, TaskState, bind_key};
use taskgrid_roster::Tasks;

use crate::command::TransitionCommand;
use crate::error::{ManagerError, ManagerResult, Stage};
use crate::manager::Manager;
use crate::wait::bounded;

const CONFIGURE_EVENT: &str = "CONFIGURE";

impl Manager {
    /// Push configuration to `tasks` and move them from `STANDBY` to
    /// `CONFIGURED`.
    ///
    /// Every task must be owned by `env_id`. The inbound endpoints of all
    /// tasks in the batch are gathered into a bind map that resolves the
    /// outbound channels of their roles.
    pub async fn configure_tasks(&self, env_id: EnvironmentId, tasks: &Tasks) -> ManagerResult<()> {
        let targets = tasks.command_targets()?;

        let arguments = {
            let _roster = self.roster.read().await;

            let mut bind_map = BindMap::new();
            for task in tasks {
                let role = match (task.parent(), task.environment_id()) {
                    (Some(role), Some(owner)) if owner == env_id => role,
                    (_, Some(owner)) => {
                        return Err(ManagerError::Locked {
                            task_id: task.id().to_string(),
                            env_id: owner,
                        });
                    }
                    _ => {
                        return Err(ManagerError::NotOwned {
                            task_id: task.id().to_string(),
                            env_id,
                        });
                    }
                };
                let path = role.path();
                for (channel, port) in task.bind_ports() {
                    bind_map.insert(
                        bind_key(&path, channel),
                        Endpoint {
                            host: task.hostname().to_string(),
                            port: *port,
                        },
                    );
                }
            }
            debug!(%env_id, endpoints = bind_map.len(), ?bind_map, "bind map generated");

            let mut arguments = HashMap::with_capacity(tasks.len());
            for task in tasks {
                arguments.insert(task.id().to_string(), task.build_property_map(&bind_map)?);
            }
            arguments
        };
        debug!(%env_id, tasks = tasks.len(), "pushing configuration to tasks");

        let command = TransitionCommand::new(
            targets,
            TaskState::Standby,
            CONFIGURE_EVENT,
            TaskState::Configured,
            arguments,
        );
        self.send_transition(command).await
    }

    /// Drive `tasks` along one edge of their state machine. `common_args`,
    /// when non-empty, is sent to every task.
    pub async fn transition_tasks(
        &self,
        tasks: &Tasks,
        source: TaskState,
        event: &str,
        destination: TaskState,
        common_args: &PropertyMap,
    ) -> ManagerResult<()> {
        let targets = tasks.command_targets()?;

        let mut arguments = HashMap::new();
        if !common_args.is_empty() {
            for target in &targets {
                arguments.insert(target.task_id.clone(), common_args.clone());
            }
        }

        let command = TransitionCommand::new(targets, source, event, destination, arguments);
        self.send_transition(command).await
    }

    async fn send_transition(&self, command: TransitionCommand) -> ManagerResult<()> {
        let command_id = command.id;
        let event = command.event.clone();
        let (reply, response) = oneshot::channel();
        self.commands.enqueue(command, reply);

        let response = bounded(
            Stage::CommandResponse,
            async { response.await.ok() },
            self.config.command_timeout(),
            &self.cancel,
        )
        .await??;

        if !response.is_ok() {
            warn!(%command_id, %event, error = %response.err_text(), "transition failed");
            return Err(ManagerError::TransitionFailed(response.err_text().to_string()));
        }
        debug!(%command_id, %event, "transition done");
        Ok(())
    }
}
