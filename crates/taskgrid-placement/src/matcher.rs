//! Matching engine — claims existing idle tasks for descriptors.
//!
//! A roster task can take over a descriptor when:
//! 1. It is unlocked
//! 2. It is of exactly the class the descriptor names, and that class is
//!    registered
//! 3. Its agent's attributes satisfy the descriptor's constraints merged
//!    over the class constraints
//!
//! Candidates are scanned in roster order and the first one not yet
//! claimed in this batch wins. There is no backtracking.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use taskgrid_class::{ClassLookup, TaskClass};
use taskgrid_core::{AttributeCache, Constraints};
use taskgrid_roster::{DeploymentMap, Descriptor, Task, Tasks};

/// The outcome of matching a batch of descriptors.
#[derive(Debug, Clone, Default)]
pub struct MatchPlan {
    /// Descriptors no existing task could take; these need new tasks.
    pub to_deploy: Vec<Descriptor>,
    /// Existing tasks claimed for descriptors.
    pub already_running: DeploymentMap,
}

impl MatchPlan {
    /// Whether every descriptor was matched to an existing task.
    pub fn fully_matched(&self) -> bool {
        self.to_deploy.is_empty()
    }
}

/// Descriptor constraints take precedence over class constraints on the
/// same attribute.
pub fn effective_constraints(descriptor: &Descriptor, class: &TaskClass) -> Constraints {
    descriptor.role_constraints.merge_parent(&class.constraints)
}

/// Whether `task` could take over `descriptor`, claims aside.
pub fn is_candidate(
    task: &Task,
    descriptor: &Descriptor,
    constraints: &Constraints,
    agents: &dyn AttributeCache,
) -> bool {
    if task.is_locked() || task.class_name() != descriptor.task_class_name {
        return false;
    }
    agents
        .get(task.agent_id())
        .is_some_and(|attributes| attributes.satisfies(constraints))
}

/// Split `descriptors` into those matched by idle roster tasks and those
/// that need deployment.
pub fn match_descriptors(
    descriptors: &[Descriptor],
    roster: &Tasks,
    classes: &dyn ClassLookup,
    agents: &dyn AttributeCache,
) -> MatchPlan {
    let mut plan = MatchPlan::default();
    let mut claimed: HashSet<String> = HashSet::new();

    for descriptor in descriptors {
        match find_candidate(descriptor, roster, classes, agents, &claimed) {
            Some(task) => {
                debug!(
                    task_id = %task.id(),
                    role = %descriptor.task_role.path(),
                    "claimed existing task"
                );
                claimed.insert(task.id().to_string());
                plan.already_running.insert(task, descriptor.clone());
            }
            None => plan.to_deploy.push(descriptor.clone()),
        }
    }

    debug!(
        descriptors = descriptors.len(),
        matched = plan.already_running.len(),
        to_deploy = plan.to_deploy.len(),
        "descriptors matched against roster"
    );
    plan
}

fn find_candidate(
    descriptor: &Descriptor,
    roster: &Tasks,
    classes: &dyn ClassLookup,
    agents: &dyn AttributeCache,
    claimed: &HashSet<String>,
) -> Option<Arc<Task>> {
    let class = classes.lookup(&descriptor.task_class_name)?;
    let constraints = effective_constraints(descriptor, &class);

    roster
        .iter()
        .find(|task| {
            !claimed.contains(task.id()) && is_candidate(task, descriptor, &constraints, agents)
        })
        .cloned()
}
