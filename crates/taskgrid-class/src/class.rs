//! The `TaskClass` model and its YAML definition format.
//!
//! ```yaml
//! name: readout
//! control:
//!   mode: fairmq
//! command:
//!   shell: true
//!   value: readout.exe
//!   arguments: ["--config", "file:/etc/readout.cfg"]
//! wants:
//!   cpu: 0.5
//!   memory: "128"
//!   ports: "47100:47110"
//! bind:
//!   - name: data
//!     type: push
//! properties:
//!   severity: info
//! constraints:
//!   - attribute: machine_id
//!     value: flp-01
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskgrid_core::{Constraints, Inbound, ParsePortsError, PropertyMap, Ranges, parse_port_ranges};

use crate::error::ClassError;
use crate::identifier::ClassIdentifier;

/// How the control plane drives a task's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Direct,
    Fairmq,
    Basic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    #[serde(default)]
    pub mode: ControlMode,
}

/// What to execute for a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandInfo {
    pub env: Vec<String>,
    pub shell: Option<bool>,
    pub value: Option<String>,
    pub arguments: Vec<String>,
    pub user: Option<String>,
}

/// Resources a task of this class asks for. Any of them may be unspecified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWants")]
pub struct ResourceWants {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub ports: Ranges,
}

#[derive(Debug, Error)]
pub enum WantsError {
    #[error("invalid {field} quantity {value:?}")]
    Quantity { field: &'static str, value: String },
    #[error(transparent)]
    Ports(#[from] ParsePortsError),
}

/// Quantities are decimal strings in definitions, but a bare YAML number
/// is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum Quantity {
    Number(f64),
    Text(String),
}

impl Quantity {
    fn parse(self, field: &'static str) -> Result<f64, WantsError> {
        match self {
            Quantity::Number(n) => Ok(n),
            Quantity::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| WantsError::Quantity { field, value: s }),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawWants {
    cpu: Option<Quantity>,
    memory: Option<Quantity>,
    ports: Option<String>,
}

impl TryFrom<RawWants> for ResourceWants {
    type Error = WantsError;

    fn try_from(raw: RawWants) -> Result<Self, Self::Error> {
        Ok(Self {
            cpu: raw.cpu.map(|q| q.parse("cpu")).transpose()?,
            memory: raw.memory.map(|q| q.parse("memory")).transpose()?,
            ports: match raw.ports {
                Some(ports) => parse_port_ranges(&ports)?,
                None => Ranges::default(),
            },
        })
    }
}

/// On-disk shape of a class definition.
#[derive(Deserialize)]
struct ClassDefinition {
    name: String,
    #[serde(default)]
    control: Control,
    #[serde(default)]
    command: CommandInfo,
    #[serde(default)]
    wants: ResourceWants,
    #[serde(default)]
    bind: Vec<Inbound>,
    #[serde(default)]
    properties: PropertyMap,
    #[serde(default)]
    constraints: Constraints,
}

/// Template for how to run and configure a kind of task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskClass {
    pub identifier: ClassIdentifier,
    pub control: Control,
    pub command: CommandInfo,
    pub wants: ResourceWants,
    pub bind: Vec<Inbound>,
    pub properties: PropertyMap,
    pub constraints: Constraints,
}

impl TaskClass {
    /// Parse a YAML definition loaded for `identifier`.
    ///
    /// The definition's `name` must match the identifier's class name.
    pub fn from_yaml(identifier: ClassIdentifier, text: &str) -> Result<Self, ClassError> {
        let def: ClassDefinition = serde_yaml::from_str(text).map_err(|source| ClassError::Parse {
            id: identifier.to_string(),
            source,
        })?;

        if def.name != identifier.name {
            return Err(ClassError::NameMismatch {
                id: identifier.to_string(),
                found: def.name,
            });
        }

        Ok(Self {
            identifier,
            control: def.control,
            command: def.command,
            wants: def.wants,
            bind: def.bind,
            properties: def.properties,
            constraints: def.constraints,
        })
    }

    /// Registry key of this class.
    pub fn key(&self) -> String {
        self.identifier.to_string()
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }
}

/// Two classes are equal when they run the same command with the same
/// resource wants. Bindings, properties and constraints do not take part.
impl PartialEq for TaskClass {
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command
            && self.wants.cpu == other.wants.cpu
            && self.wants.memory == other.wants.memory
            && self.wants.ports == other.wants.ports
    }
}
