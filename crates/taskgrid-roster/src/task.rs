//! Task — one realized instance of a task class.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use taskgrid_class::{ClassLookup, TaskClass, canonical_name};
use taskgrid_core::{
    AgentId, BindMap, EnvironmentId, Offer, Outbound, PropertyMap, TaskId, TaskState, TaskStatus,
};

use crate::error::{TaskError, TaskResult};

const TCP_SCHEME: &str = "tcp://";

/// The role that owns a task.
///
/// Implemented by the role/environment tree. A role notified through
/// [`ParentRole::set_task`] should keep a `Weak` reference if it needs to
/// outlive the ownership link.
pub trait ParentRole: Send + Sync {
    /// Dotted path of the role in its environment tree.
    fn path(&self) -> String;

    /// The environment the role is attached to, if any.
    fn environment_id(&self) -> Option<EnvironmentId>;

    /// Called once the task is committed to this role.
    fn set_task(&self, task: Arc<Task>);

    fn update_state(&self, state: TaskState);

    fn update_status(&self, status: TaskStatus);

    /// Channels this role connects out of.
    fn outbound_channels(&self) -> Vec<Outbound> {
        Vec::new()
    }
}

/// Where transition commands for a task are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandTarget {
    pub agent_id: AgentId,
    pub executor_id: String,
    pub task_id: TaskId,
}

struct Runtime {
    parent: Option<Arc<dyn ParentRole>>,
    state: TaskState,
    status: TaskStatus,
}

/// A runtime task instance.
///
/// Identity and placement are fixed at construction. Ownership, state and
/// status change over the task's life and are guarded by a per-task lock
/// that is only held for the field access itself.
pub struct Task {
    id: TaskId,
    name: String,
    class_name: String,
    hostname: String,
    agent_id: AgentId,
    offer_id: String,
    executor_id: String,
    bind_ports: BTreeMap<String, u64>,
    classes: Arc<dyn ClassLookup>,
    runtime: RwLock<Runtime>,
}

impl Task {
    /// Create an unowned `STANDBY`/`INACTIVE` task for a realized offer.
    pub fn new(
        class_name: &str,
        offer: &Offer,
        executor_id: impl Into<String>,
        bind_ports: BTreeMap<String, u64>,
        classes: Arc<dyn ClassLookup>,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let class_name = canonical_name(class_name);
        Self {
            name: format!("{class_name}#{id}"),
            id,
            class_name,
            hostname: offer.hostname.clone(),
            agent_id: offer.agent_id.clone(),
            offer_id: offer.offer_id.clone(),
            executor_id: executor_id.into(),
            bind_ports,
            classes,
            runtime: RwLock::new(Runtime {
                parent: None,
                state: TaskState::Standby,
                status: TaskStatus::Inactive,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn offer_id(&self) -> &str {
        &self.offer_id
    }

    pub fn executor_id(&self) -> &str {
        &self.executor_id
    }

    /// Inbound channel name → allocated port.
    pub fn bind_ports(&self) -> &BTreeMap<String, u64> {
        &self.bind_ports
    }

    /// The current definition of this task's class, if still registered.
    pub fn task_class(&self) -> Option<Arc<TaskClass>> {
        self.classes.lookup(&self.class_name)
    }

    // ── Ownership ──────────────────────────────────────────────────

    pub fn parent(&self) -> Option<Arc<dyn ParentRole>> {
        self.runtime.read().parent.clone()
    }

    pub fn set_parent(&self, parent: Option<Arc<dyn ParentRole>>) {
        self.runtime.write().parent = parent;
    }

    /// The environment of the owning role.
    pub fn environment_id(&self) -> Option<EnvironmentId> {
        self.parent().and_then(|p| p.environment_id())
    }

    /// A task is locked while its owning role belongs to an environment.
    pub fn is_locked(&self) -> bool {
        self.environment_id().is_some()
    }

    // ── State ──────────────────────────────────────────────────────

    pub fn state(&self) -> TaskState {
        self.runtime.read().state
    }

    pub fn set_state(&self, state: TaskState) {
        self.runtime.write().state = state;
    }

    pub fn status(&self) -> TaskStatus {
        self.runtime.read().status
    }

    pub fn set_status(&self, status: TaskStatus) {
        self.runtime.write().status = status;
    }

    // ── Configuration ──────────────────────────────────────────────

    pub fn command_target(&self) -> TaskResult<CommandTarget> {
        if self.agent_id.is_empty() || self.executor_id.is_empty() {
            return Err(TaskError::NoCommandTarget {
                task_id: self.id.clone(),
                agent_id: self.agent_id.clone(),
                executor_id: self.executor_id.clone(),
            });
        }
        Ok(CommandTarget {
            agent_id: self.agent_id.clone(),
            executor_id: self.executor_id.clone(),
            task_id: self.id.clone(),
        })
    }

    /// Build the configuration pushed to this task.
    ///
    /// Starts from the class properties, then adds `chans.<name>.*` entries
    /// for every bound inbound channel and for every outbound channel of the
    /// owning role. Outbound targets are resolved through `bind_map` unless
    /// they already are `tcp://` addresses.
    pub fn build_property_map(&self, bind_map: &BindMap) -> TaskResult<PropertyMap> {
        let class = self.task_class().ok_or_else(|| TaskError::ClassUnavailable {
            task_id: self.id.clone(),
            class: self.class_name.clone(),
        })?;

        let mut props = class.properties.clone();

        for inbound in &class.bind {
            let Some(port) = self.bind_ports.get(&inbound.name) else {
                continue;
            };
            let prefix = format!("chans.{}", inbound.name);
            props.insert(format!("{prefix}.address"), format!("tcp://*:{port}"));
            props.insert(format!("{prefix}.type"), inbound.channel_type.as_str().to_string());
            props.insert(format!("{prefix}.transport"), inbound.transport.as_str().to_string());
        }

        if let Some(parent) = self.parent() {
            for outbound in parent.outbound_channels() {
                let address = if outbound.target.starts_with(TCP_SCHEME) {
                    outbound.target.clone()
                } else {
                    bind_map
                        .get(&outbound.target)
                        .map(ToString::to_string)
                        .ok_or_else(|| TaskError::UnresolvedChannel {
                            task_id: self.id.clone(),
                            channel: outbound.name.clone(),
                            target: outbound.target.clone(),
                        })?
                };
                let prefix = format!("chans.{}", outbound.name);
                props.insert(format!("{prefix}.type"), outbound.channel_type.as_str().to_string());
                props.insert(format!("{prefix}.address"), address);
            }
        }

        Ok(props)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let runtime = self.runtime.read();
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("class", &self.class_name)
            .field("hostname", &self.hostname)
            .field("agent_id", &self.agent_id)
            .field("state", &runtime.state)
            .field("status", &runtime.status)
            .field("owned", &runtime.parent.is_some())
            .finish()
    }
}
