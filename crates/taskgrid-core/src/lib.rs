//! taskgrid-core — shared vocabulary for the taskgrid crates.
//!
//! Holds the types every other crate speaks in: task identifiers, the
//! control-plane state and liveness status of a task, placement constraints
//! and agent attributes, port ranges, channel bindings, and the manager
//! configuration file.

pub mod channel;
pub mod config;
pub mod constraint;
pub mod ports;
pub mod types;

pub use channel::{BindMap, ChannelType, Endpoint, Inbound, Outbound, PropertyMap, Transport, bind_key};
pub use config::ManagerConfig;
pub use constraint::{AgentCache, AttributeCache, Attributes, Constraint, Constraints, Operator};
pub use ports::{ParsePortsError, PortRange, Ranges, parse_port_ranges};
pub use types::*;
