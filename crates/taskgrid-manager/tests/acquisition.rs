//! End-to-end acquisition against an in-process offer source.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use uuid::Uuid;

use taskgrid_class::MemoryClassLoader;
use taskgrid_core::{
    AgentCache, Attributes, Constraint, Constraints, EnvironmentId, LivenessEvent, ManagerConfig,
    Offer, TaskState, TaskStatus, TaskStatusEvent,
};
use taskgrid_manager::{
    CommandResponse, Manager, ManagerError, OfferRequest, OfferSource, TaskKiller, command_channel,
    offer_channel,
};
use taskgrid_roster::{DeploymentMap, Descriptor, ParentRole, Task, TaskFactory, Tasks};

const READOUT: &str = "github.com/org/workflows/tasks/readout@master";

struct Role {
    path: String,
    env: EnvironmentId,
    tasks: Mutex<Vec<String>>,
}

impl Role {
    fn new(path: &str, env: EnvironmentId) -> Arc<Self> {
        Arc::new(Self {
            path: path.to_string(),
            env,
            tasks: Mutex::new(Vec::new()),
        })
    }
}

impl ParentRole for Role {
    fn path(&self) -> String {
        self.path.clone()
    }
    fn environment_id(&self) -> Option<EnvironmentId> {
        Some(self.env)
    }
    fn set_task(&self, task: Arc<Task>) {
        self.tasks.lock().push(task.id().to_string());
    }
    fn update_state(&self, _state: TaskState) {}
    fn update_status(&self, _status: TaskStatus) {}
}

#[derive(Default)]
struct Killer {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TaskKiller for Killer {
    async fn kill(&self, _task: &Task) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A scheduler stand-in: realizes up to `capacity` tasks per deploy
/// request on fresh hosts, registering each host's agent attributes.
struct Scheduler {
    requests: Arc<AtomicUsize>,
}

impl Scheduler {
    fn spawn(
        mut source: OfferSource,
        factory: TaskFactory,
        agents: Arc<AgentCache>,
        capacity: usize,
    ) -> Self {
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        tokio::spawn(async move {
            let mut next_host = 0;
            while let Some(request) = source.recv().await {
                counter.fetch_add(1, Ordering::SeqCst);
                match request {
                    OfferRequest::Revive(req) => req.acknowledge(),
                    OfferRequest::Deploy(req) => {
                        let mut deployed = DeploymentMap::new();
                        for descriptor in req.descriptors().iter().take(capacity) {
                            next_host += 1;
                            let host = format!("flp-{next_host:02}");
                            let offer = Offer {
                                hostname: host.clone(),
                                agent_id: format!("agent-{host}"),
                                offer_id: format!("offer-{host}"),
                            };
                            agents.update(
                                offer.agent_id.clone(),
                                Attributes::new().with("machine_id", host.clone()),
                            );
                            let ports = BTreeMap::from([("data".to_string(), 47100)]);
                            let task = factory.new_task_for_offer(&offer, descriptor, ports, "exec");
                            deployed.insert(task, descriptor.clone());
                        }
                        let _ = req.complete(deployed);
                    }
                }
            }
        });
        Self { requests }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

struct Plane {
    manager: Arc<Manager>,
    scheduler: Scheduler,
    killer: Arc<Killer>,
}

async fn plane(capacity: usize) -> Plane {
    let (client, source) = offer_channel();
    let (queue, mut commands) = command_channel();
    tokio::spawn(async move {
        while let Some((command, reply)) = commands.recv().await {
            let _ = reply.send(Ok(CommandResponse::ok(command.id)));
        }
    });

    let loader = MemoryClassLoader::new();
    loader
        .insert(READOUT, "name: readout\nbind:\n  - name: data\n    type: push\n")
        .unwrap();
    let agents = Arc::new(AgentCache::new());
    let killer = Arc::new(Killer::default());

    let manager = Manager::new(ManagerConfig::default(), client, Arc::new(queue), killer.clone())
        .with_class_loader(Arc::new(loader))
        .with_attribute_cache(agents.clone());
    manager.refresh_classes(&[READOUT.to_string()]).await.unwrap();

    let scheduler = Scheduler::spawn(source, manager.task_factory(), agents, capacity);
    Plane {
        manager: Arc::new(manager),
        scheduler,
        killer,
    }
}

fn descriptors(role: &Arc<Role>, count: usize) -> Vec<Descriptor> {
    (0..count)
        .map(|_| Descriptor::new(role.clone(), READOUT, Constraints::default()))
        .collect()
}

#[tokio::test]
async fn idle_tasks_are_reused_without_deploying() {
    let plane = plane(usize::MAX).await;

    let first = Uuid::new_v4();
    let role = Role::new("first.readout", first);
    plane.manager.acquire_tasks(first, descriptors(&role, 2)).await.unwrap();
    assert_eq!(plane.scheduler.requests(), 2);

    let tasks = plane.manager.tasks().await;
    plane.manager.release_tasks(first, &tasks).await.unwrap();

    let second = Uuid::new_v4();
    let role = Role::new("second.readout", second);
    plane.manager.acquire_tasks(second, descriptors(&role, 2)).await.unwrap();

    assert_eq!(plane.scheduler.requests(), 2, "no new rendezvous");
    assert_eq!(plane.manager.task_count().await, 2);
    for task in &plane.manager.tasks().await {
        assert_eq!(task.environment_id(), Some(second));
    }
    assert_eq!(role.tasks.lock().len(), 2);
}

#[tokio::test]
async fn constraints_can_force_a_deployment() {
    let plane = plane(usize::MAX).await;

    let first = Uuid::new_v4();
    let role = Role::new("first.readout", first);
    plane.manager.acquire_tasks(first, descriptors(&role, 1)).await.unwrap();
    let tasks = plane.manager.tasks().await;
    plane.manager.release_tasks(first, &tasks).await.unwrap();

    // The idle task runs on flp-01; ask for flp-02.
    let second = Uuid::new_v4();
    let role = Role::new("second.readout", second);
    let pinned = Descriptor::new(
        role,
        READOUT,
        Constraints::new(vec![Constraint::equals("machine_id", "flp-02")]),
    );
    plane.manager.acquire_tasks(second, vec![pinned]).await.unwrap();

    assert_eq!(plane.scheduler.requests(), 4);
    assert_eq!(plane.manager.task_count().await, 2);
}

#[tokio::test]
async fn short_deployment_commits_no_ownership() {
    let plane = plane(2).await;

    let env = Uuid::new_v4();
    let role = Role::new("env.readout", env);
    let err = plane
        .manager
        .acquire_tasks(env, descriptors(&role, 3))
        .await
        .unwrap_err();

    let task_ids = match err {
        ManagerError::PartialDeployment { task_ids } => task_ids,
        other => panic!("expected partial deployment, got {other:?}"),
    };
    assert_eq!(task_ids.len(), 2);

    // Every realized task is kept, none of them is locked.
    let roster = plane.manager.tasks().await;
    assert_eq!(roster.len(), 2);
    for id in &task_ids {
        let task = roster.get_by_task_id(id).unwrap();
        assert!(!task.is_locked());
    }
    assert!(role.tasks.lock().is_empty());

    // The leftovers are idle and can be cleaned up.
    let outcome = plane.manager.cleanup().await.unwrap();
    assert_eq!(outcome.removed.len(), 2);
    assert_eq!(plane.manager.task_count().await, 0);
}

#[tokio::test]
async fn release_is_scoped_to_the_owner() {
    let plane = plane(usize::MAX).await;

    let owner = Uuid::new_v4();
    let role = Role::new("owner.readout", owner);
    plane.manager.acquire_tasks(owner, descriptors(&role, 1)).await.unwrap();
    let tasks = plane.manager.tasks().await;

    let intruder = Uuid::new_v4();
    let err = plane.manager.release_tasks(intruder, &tasks).await.unwrap_err();
    assert!(matches!(err, ManagerError::Locked { env_id, .. } if env_id == owner));
    assert!(tasks.iter().all(|t| t.environment_id() == Some(owner)));

    plane.manager.release_tasks(owner, &tasks).await.unwrap();
    // Releasing again is tolerated.
    plane.manager.release_tasks(owner, &tasks).await.unwrap();
    assert!(tasks.iter().all(|t| !t.is_locked()));
}

#[tokio::test]
async fn kill_with_unknown_id_kills_nothing() {
    let plane = plane(usize::MAX).await;

    let env = Uuid::new_v4();
    let role = Role::new("env.readout", env);
    plane.manager.acquire_tasks(env, descriptors(&role, 2)).await.unwrap();
    let tasks = plane.manager.tasks().await;
    plane.manager.release_tasks(env, &tasks).await.unwrap();
    for task in &tasks {
        plane
            .manager
            .update_task_status(&TaskStatusEvent::new(task.id(), LivenessEvent::Running))
            .await;
    }

    let mut ids = tasks.ids();
    ids.push("no-such-task".to_string());
    let err = plane.manager.kill_tasks(&ids).await.unwrap_err();
    assert!(matches!(err, ManagerError::TasksNotFound { .. }));
    assert_eq!(plane.manager.task_count().await, 2);
    assert_eq!(plane.killer.calls.load(Ordering::SeqCst), 0);

    let outcome = plane.manager.kill_tasks(&tasks.ids()).await.unwrap();
    assert_eq!(outcome.killed.len(), 2);
    assert!(outcome.running.is_empty());
    assert_eq!(plane.killer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn configure_after_acquire() {
    let plane = plane(usize::MAX).await;

    let env = Uuid::new_v4();
    let role = Role::new("env.readout", env);
    plane.manager.acquire_tasks(env, descriptors(&role, 2)).await.unwrap();

    let tasks: Tasks = plane.manager.tasks().await;
    plane.manager.configure_tasks(env, &tasks).await.unwrap();

    for task in &tasks {
        plane.manager.update_task_state(task.id(), "CONFIGURED").await;
        assert_eq!(task.state(), TaskState::Configured);
    }
}
