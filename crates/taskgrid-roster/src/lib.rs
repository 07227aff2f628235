//! taskgrid-roster — runtime tasks and the requests that produce them.
//!
//! A [`Task`] is one realized instance of a task class on some agent. It
//! carries two independent state axes: the control-plane `TaskState`
//! driven by transition commands, and the liveness `TaskStatus` reported
//! by the resource manager. A task may be owned by a role ([`ParentRole`]);
//! when that role belongs to an environment the task is *locked*.
//!
//! # Components
//!
//! - **`task`** — `Task`, its ownership and property-map construction
//! - **`tasks`** — The ordered `Tasks` collection the roster is made of
//! - **`descriptor`** — `Descriptor` requests and the `DeploymentMap`
//! - **`factory`** — `TaskFactory`, used by the offer source to build tasks

pub mod descriptor;
pub mod error;
pub mod factory;
pub mod task;
pub mod tasks;

pub use descriptor::{DeploymentMap, Descriptor};
pub use error::{TaskError, TaskResult};
pub use factory::TaskFactory;
pub use task::{CommandTarget, ParentRole, Task};
pub use tasks::Tasks;
