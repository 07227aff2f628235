//! Shared types used across taskgrid crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a task instance (a UUID string).
pub type TaskId = String;

/// Identifier of a resource-manager agent (one per host).
pub type AgentId = String;

/// Identifier of the environment a role belongs to.
pub type EnvironmentId = uuid::Uuid;

// ── State ─────────────────────────────────────────────────────────

/// Control-plane lifecycle position of a task.
///
/// Driven by explicit transition commands and acknowledged through
/// state events from the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Unknown,
    Standby,
    Configured,
    Running,
    Error,
    Done,
}

impl TaskState {
    /// Parse a state name as reported by a task. Unrecognized names map
    /// to [`TaskState::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "STANDBY" => TaskState::Standby,
            "CONFIGURED" => TaskState::Configured,
            "RUNNING" => TaskState::Running,
            "ERROR" => TaskState::Error,
            "DONE" => TaskState::Done,
            _ => TaskState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Unknown => "UNKNOWN",
            TaskState::Standby => "STANDBY",
            TaskState::Configured => "CONFIGURED",
            TaskState::Running => "RUNNING",
            TaskState::Error => "ERROR",
            TaskState::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Status ────────────────────────────────────────────────────────

/// Liveness of a task as reported by the resource manager.
///
/// Independent of [`TaskState`]: a task can be `Active` while still
/// in `Standby`, or `Inactive` while its last known state is `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Active,
    Inactive,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Active => f.write_str("ACTIVE"),
            TaskStatus::Inactive => f.write_str("INACTIVE"),
        }
    }
}

/// Kinds of task status updates emitted by the resource manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessEvent {
    Staging,
    Starting,
    Running,
    Finished,
    Dropped,
    Lost,
    Killed,
    Failed,
    Error,
}

impl LivenessEvent {
    /// The liveness status this event implies, if any.
    ///
    /// Transitional kinds (`Staging`, `Starting`) and `Finished` carry no
    /// liveness change.
    pub fn liveness(&self) -> Option<TaskStatus> {
        match self {
            LivenessEvent::Running => Some(TaskStatus::Active),
            LivenessEvent::Dropped
            | LivenessEvent::Lost
            | LivenessEvent::Killed
            | LivenessEvent::Failed
            | LivenessEvent::Error => Some(TaskStatus::Inactive),
            LivenessEvent::Staging | LivenessEvent::Starting | LivenessEvent::Finished => None,
        }
    }
}

/// A status update for one task, as delivered by the resource manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusEvent {
    pub task_id: TaskId,
    pub kind: LivenessEvent,
    /// Free-form message attached by the resource manager.
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskStatusEvent {
    pub fn new(task_id: impl Into<TaskId>, kind: LivenessEvent) -> Self {
        Self {
            task_id: task_id.into(),
            kind,
            message: None,
        }
    }
}

// ── Offer ─────────────────────────────────────────────────────────

/// The placement a resource offer supplied for one realized task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub hostname: String,
    pub agent_id: AgentId,
    pub offer_id: String,
}
