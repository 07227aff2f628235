//! Placement constraints and agent attributes.
//!
//! A task class and a role request can both carry constraints on the
//! attributes of the agent a task runs on. The role's constraints are merged
//! over the class's, and an agent qualifies when its attributes satisfy the
//! merged set.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::AgentId;

/// How a constraint compares against an agent attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// The attribute must be present with exactly `value`.
    #[default]
    Equals,
    /// The attribute must be present; its value is ignored.
    Exists,
}

/// A single placement constraint on one agent attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub attribute: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
}

impl Constraint {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: Operator::Equals,
            value: value.into(),
        }
    }

    pub fn exists(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: Operator::Exists,
            value: String::new(),
        }
    }
}

/// An ordered list of constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self(constraints)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.0.iter()
    }

    /// Merge `parent` under `self`.
    ///
    /// Every constraint of `self` is kept; a parent constraint is added only
    /// when `self` has none on the same attribute.
    pub fn merge_parent(&self, parent: &Constraints) -> Constraints {
        let mut merged = self.0.clone();
        for constraint in &parent.0 {
            if !self.0.iter().any(|c| c.attribute == constraint.attribute) {
                merged.push(constraint.clone());
            }
        }
        Constraints(merged)
    }
}

impl FromIterator<Constraint> for Constraints {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Attributes advertised by an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether these attributes satisfy every constraint in the set.
    pub fn satisfies(&self, constraints: &Constraints) -> bool {
        constraints.iter().all(|c| match (c.operator, self.0.get(&c.attribute)) {
            (Operator::Equals, Some(v)) => *v == c.value,
            (Operator::Exists, Some(_)) => true,
            (_, None) => false,
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Lookup of agent attributes by agent id.
pub trait AttributeCache: Send + Sync {
    fn get(&self, agent_id: &str) -> Option<Attributes>;
}

/// In-memory [`AttributeCache`] fed by the resource-offer source.
#[derive(Debug, Default)]
pub struct AgentCache {
    agents: RwLock<HashMap<AgentId, Attributes>>,
}

impl AgentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the attributes of an agent.
    pub fn update(&self, agent_id: impl Into<AgentId>, attributes: Attributes) {
        self.agents.write().insert(agent_id.into(), attributes);
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}

impl AttributeCache for AgentCache {
    fn get(&self, agent_id: &str) -> Option<Attributes> {
        self.agents.read().get(agent_id).cloned()
    }
}
