//! Transition commands and the queue that delivers them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use taskgrid_core::{PropertyMap, TaskId, TaskState};
use taskgrid_roster::CommandTarget;

/// One state-machine transition applied to a batch of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCommand {
    pub id: Uuid,
    pub targets: Vec<CommandTarget>,
    pub source: TaskState,
    pub event: String,
    pub destination: TaskState,
    /// Per-task arguments, keyed by task id.
    pub arguments: HashMap<TaskId, PropertyMap>,
}

impl TransitionCommand {
    pub fn new(
        targets: Vec<CommandTarget>,
        source: TaskState,
        event: impl Into<String>,
        destination: TaskState,
        arguments: HashMap<TaskId, PropertyMap>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            targets,
            source,
            event: event.into(),
            destination,
            arguments,
        }
    }
}

/// The aggregated answer of all targets of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command_id: Uuid,
    error: String,
}

impl CommandResponse {
    pub fn ok(command_id: Uuid) -> Self {
        Self {
            command_id,
            error: String::new(),
        }
    }

    pub fn failed(command_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            command_id,
            error: error.into(),
        }
    }

    /// Error text reported by the targets; empty on success.
    pub fn err_text(&self) -> &str {
        &self.error
    }

    pub fn is_ok(&self) -> bool {
        self.error.trim().is_empty()
    }
}

/// The command could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command transport failed: {0}")]
pub struct TransportError(pub String);

pub type CommandReply = oneshot::Sender<Result<CommandResponse, TransportError>>;

/// Delivers commands to running tasks.
///
/// `enqueue` must not block; the answer arrives on `reply`. Dropping
/// `reply` without sending counts as no response.
pub trait CommandQueue: Send + Sync {
    fn enqueue(&self, command: TransitionCommand, reply: CommandReply);
}

/// A [`CommandQueue`] that hands commands to an in-process consumer.
#[derive(Debug, Clone)]
pub struct ChannelCommandQueue {
    tx: mpsc::UnboundedSender<(TransitionCommand, CommandReply)>,
}

pub type CommandReceiver = mpsc::UnboundedReceiver<(TransitionCommand, CommandReply)>;

/// Create a queue and the receiver its commands come out of.
pub fn command_channel() -> (ChannelCommandQueue, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelCommandQueue { tx }, rx)
}

impl CommandQueue for ChannelCommandQueue {
    fn enqueue(&self, command: TransitionCommand, reply: CommandReply) {
        if let Err(mpsc::error::SendError((command, reply))) = self.tx.send((command, reply)) {
            let _ = reply.send(Err(TransportError(format!(
                "command {} dropped: queue closed",
                command.id
            ))));
        }
    }
}
