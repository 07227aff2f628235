//! taskgrid-manager — the task manager of the run-control plane.
//!
//! The [`Manager`] owns the roster of every task known to the control
//! plane and the registry of classes they are instantiated from. It
//!
//! - Acquires tasks for environments, reusing idle ones before asking the
//!   offer source to deploy new ones
//! - Pushes configuration and drives state-machine transitions through a
//!   command queue
//! - Reconciles state and liveness reports and kills tasks on request
//!
//! # Architecture
//!
//! ```text
//! Manager
//!   ├── RwLock<Tasks>         roster, the consistency boundary
//!   ├── ClassRegistry         mutated only under the roster write lock
//!   ├── OfferClient  ───────▶ OfferSource   (revive / deploy rendezvous)
//!   ├── CommandQueue ───────▶ running tasks (transition commands)
//!   └── TaskKiller   ───────▶ resource manager
//! ```

mod acquire;
pub mod command;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod rendezvous;
mod transition;
mod wait;

pub use command::{
    ChannelCommandQueue, CommandQueue, CommandReceiver, CommandReply, CommandResponse,
    TransitionCommand, TransportError, command_channel,
};
pub use error::{ManagerError, ManagerResult, RendezvousError, Stage};
pub use lifecycle::{KillOutcome, TaskKiller};
pub use manager::Manager;
pub use rendezvous::{
    DeployRequest, OfferClient, OfferRequest, OfferSource, PendingDeployment, ReviveRequest,
    offer_channel,
};
