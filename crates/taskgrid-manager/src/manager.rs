//! Manager — owns the roster and the class registry.
//!
//! One `Manager` is shared (behind an `Arc`) by everything that acquires,
//! configures or reconciles tasks. A single async `RwLock` over the roster
//! is the consistency boundary: the class registry is only mutated while
//! its write guard is held.
//!
//! Operations are spread over sibling modules:
//! - `acquire` — acquisition and release
//! - `transition` — configuration and state-machine transitions
//! - `lifecycle` — state/status reconciliation and the kill path

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use taskgrid_class::{ClassLoader, ClassRegistry, FsClassLoader, RefreshSummary, TaskClass};
use taskgrid_core::{AgentCache, AttributeCache, ManagerConfig};
use taskgrid_roster::{Task, TaskFactory, Tasks};

use crate::command::CommandQueue;
use crate::error::ManagerResult;
use crate::lifecycle::TaskKiller;
use crate::rendezvous::OfferClient;

/// Task manager for one control plane.
pub struct Manager {
    pub(crate) config: ManagerConfig,
    pub(crate) roster: Arc<RwLock<Tasks>>,
    pub(crate) classes: ClassRegistry,
    pub(crate) loader: Arc<dyn ClassLoader>,
    pub(crate) agents: Arc<dyn AttributeCache>,
    pub(crate) offers: OfferClient,
    pub(crate) commands: Arc<dyn CommandQueue>,
    pub(crate) killer: Arc<dyn TaskKiller>,
    pub(crate) cancel: CancellationToken,
}

impl Manager {
    /// Create a manager with an empty roster and an empty class registry.
    ///
    /// Class definitions are read from `config.repositories_path` and agent
    /// attributes come from a fresh in-memory [`AgentCache`] unless
    /// replaced with the `with_*` builders.
    pub fn new(
        config: ManagerConfig,
        offers: OfferClient,
        commands: Arc<dyn CommandQueue>,
        killer: Arc<dyn TaskKiller>,
    ) -> Self {
        let loader = Arc::new(FsClassLoader::new(config.repositories_path.clone()));
        Self {
            config,
            roster: Arc::new(RwLock::new(Tasks::new())),
            classes: ClassRegistry::new(),
            loader,
            agents: Arc::new(AgentCache::new()),
            offers,
            commands,
            killer,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a different source of agent attributes.
    pub fn with_attribute_cache(mut self, agents: Arc<dyn AttributeCache>) -> Self {
        self.agents = agents;
        self
    }

    /// Use a different source of class definitions.
    pub fn with_class_loader(mut self, loader: Arc<dyn ClassLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Factory for the offer source, bound to this manager's registry.
    pub fn task_factory(&self) -> TaskFactory {
        TaskFactory::new(Arc::new(self.classes.clone()))
    }

    /// Abort every pending and future wait on collaborators.
    pub fn shutdown(&self) {
        info!("task manager shutting down");
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ── Classes ────────────────────────────────────────────────────

    /// Load the named classes into the registry, pruning every class no
    /// roster task uses.
    pub async fn refresh_classes(&self, required: &[String]) -> ManagerResult<RefreshSummary> {
        let roster = self.roster.write().await;
        let summary = self.classes.refresh(required, self.loader.as_ref(), |key| {
            roster.iter().any(|t| t.class_name() == key)
        })?;
        Ok(summary)
    }

    /// Drop the unused classes of one repository.
    pub async fn remove_repo_classes(&self, repo_path: &str) -> usize {
        let roster = self.roster.write().await;
        self.classes
            .remove_repo_classes(repo_path, |key| roster.iter().any(|t| t.class_name() == key))
    }

    pub fn get_task_class(&self, name: &str) -> Option<Arc<TaskClass>> {
        self.classes.get(name)
    }

    pub fn class_registry(&self) -> &ClassRegistry {
        &self.classes
    }

    // ── Queries ────────────────────────────────────────────────────

    pub async fn task_count(&self) -> usize {
        self.roster.read().await.len()
    }

    /// Snapshot of the roster.
    pub async fn tasks(&self) -> Tasks {
        self.roster.read().await.clone()
    }

    pub async fn get_task(&self, id: &str) -> Option<Arc<Task>> {
        self.roster.read().await.get_by_task_id(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use parking_lot::Mutex;
    use taskgrid_class::MemoryClassLoader;
    use taskgrid_core::{EnvironmentId, Offer, Outbound, TaskState, TaskStatus};
    use taskgrid_roster::ParentRole;

    use crate::command::{CommandReceiver, command_channel};
    use crate::rendezvous::{OfferSource, offer_channel};

    pub(crate) const READOUT: &str = "repo/tasks/readout@master";
    pub(crate) const QC: &str = "repo/tasks/qc@master";

    pub(crate) struct Role {
        pub path: String,
        pub env: Option<EnvironmentId>,
        pub outbound: Vec<Outbound>,
        pub tasks: Mutex<Vec<String>>,
        pub states: Mutex<Vec<TaskState>>,
        pub statuses: Mutex<Vec<TaskStatus>>,
    }

    impl Role {
        pub(crate) fn new(path: &str, env: Option<EnvironmentId>) -> Arc<Self> {
            Self::with_outbound(path, env, Vec::new())
        }

        pub(crate) fn with_outbound(
            path: &str,
            env: Option<EnvironmentId>,
            outbound: Vec<Outbound>,
        ) -> Arc<Self> {
            Arc::new(Self {
                path: path.to_string(),
                env,
                outbound,
                tasks: Mutex::new(Vec::new()),
                states: Mutex::new(Vec::new()),
                statuses: Mutex::new(Vec::new()),
            })
        }
    }

    impl ParentRole for Role {
        fn path(&self) -> String {
            self.path.clone()
        }
        fn environment_id(&self) -> Option<EnvironmentId> {
            self.env
        }
        fn set_task(&self, task: Arc<Task>) {
            self.tasks.lock().push(task.id().to_string());
        }
        fn update_state(&self, state: TaskState) {
            self.states.lock().push(state);
        }
        fn update_status(&self, status: TaskStatus) {
            self.statuses.lock().push(status);
        }
        fn outbound_channels(&self) -> Vec<Outbound> {
            self.outbound.clone()
        }
    }

    pub(crate) struct NoopKiller;

    #[async_trait::async_trait]
    impl TaskKiller for NoopKiller {
        async fn kill(&self, _task: &Task) -> anyhow::Result<()> {
            Ok(())
        }
    }

    pub(crate) fn loader() -> Arc<MemoryClassLoader> {
        let loader = MemoryClassLoader::new();
        loader
            .insert(READOUT, "name: readout\nbind:\n  - name: data\n    type: push\nproperties:\n  severity: info\n")
            .unwrap();
        loader.insert(QC, "name: qc\n").unwrap();
        Arc::new(loader)
    }

    pub(crate) struct Harness {
        pub manager: Manager,
        pub source: OfferSource,
        pub commands: CommandReceiver,
    }

    pub(crate) fn harness_with_killer(killer: Arc<dyn TaskKiller>) -> Harness {
        let (client, source) = offer_channel();
        let (queue, commands) = command_channel();
        let manager = Manager::new(ManagerConfig::default(), client, Arc::new(queue), killer)
            .with_class_loader(loader());
        Harness {
            manager,
            source,
            commands,
        }
    }

    pub(crate) fn harness() -> Harness {
        harness_with_killer(Arc::new(NoopKiller))
    }

    /// Put a task straight onto the roster, bypassing acquisition.
    pub(crate) async fn seed(manager: &Manager, class: &str, host: &str) -> Arc<Task> {
        let offer = Offer {
            hostname: host.to_string(),
            agent_id: format!("agent-{host}"),
            offer_id: format!("offer-{host}"),
        };
        let ports = BTreeMap::from([("data".to_string(), 47100)]);
        let task = Arc::new(Task::new(class, &offer, "exec", ports, Arc::new(manager.classes.clone())));
        manager.roster.write().await.push(task.clone());
        task
    }

    #[tokio::test]
    async fn starts_empty() {
        let h = harness();
        assert_eq!(h.manager.task_count().await, 0);
        assert!(h.manager.class_registry().is_empty());
    }

    #[tokio::test]
    async fn refresh_loads_and_prunes() {
        let h = harness();
        let summary = h
            .manager
            .refresh_classes(&[READOUT.to_string(), QC.to_string()])
            .await
            .unwrap();
        assert_eq!(summary.loaded, 2);

        // readout is in use by a task, qc is not.
        seed(&h.manager, READOUT, "flp-01").await;
        let summary = h.manager.refresh_classes(&[]).await.unwrap();
        assert_eq!(summary.pruned, 1);
        assert!(h.manager.get_task_class(READOUT).is_some());
        assert!(h.manager.get_task_class(QC).is_none());
    }

    #[tokio::test]
    async fn refresh_failure_leaves_registry() {
        let h = harness();
        h.manager.refresh_classes(&[QC.to_string()]).await.unwrap();

        let err = h
            .manager
            .refresh_classes(&["repo/tasks/missing".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, crate::ManagerError::Class(_)));
        assert!(h.manager.get_task_class(QC).is_some());
    }

    #[tokio::test]
    async fn remove_repo_classes_keeps_used() {
        let h = harness();
        h.manager
            .refresh_classes(&[READOUT.to_string(), QC.to_string()])
            .await
            .unwrap();
        seed(&h.manager, QC, "flp-01").await;

        assert_eq!(h.manager.remove_repo_classes("repo").await, 1);
        assert!(h.manager.get_task_class(QC).is_some());
    }

    #[tokio::test]
    async fn factory_tasks_see_registry() {
        let h = harness();
        h.manager.refresh_classes(&[QC.to_string()]).await.unwrap();

        let factory = h.manager.task_factory();
        let descriptor = taskgrid_roster::Descriptor::new(Role::new("env.qc", None), QC, Default::default());
        let offer = Offer {
            hostname: "flp-01".to_string(),
            agent_id: "agent-flp-01".to_string(),
            offer_id: "o-1".to_string(),
        };
        let task = factory.new_task_for_offer(&offer, &descriptor, BTreeMap::new(), "exec");
        assert!(task.task_class().is_some());
    }

    #[tokio::test]
    async fn queries_return_roster_entries() {
        let h = harness();
        let task = seed(&h.manager, QC, "flp-01").await;

        assert_eq!(h.manager.task_count().await, 1);
        assert_eq!(h.manager.tasks().await.ids(), vec![task.id().to_string()]);
        assert!(h.manager.get_task(task.id()).await.is_some());
        assert!(h.manager.get_task("nope").await.is_none());
    }
}
