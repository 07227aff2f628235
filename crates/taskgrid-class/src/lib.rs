//! taskgrid-class — task class definitions and the class registry.
//!
//! A task class is the template a task is instantiated from: what command
//! to run, what resources it wants, which channels it exposes and how it
//! is configured. Classes live as YAML files in version-controlled
//! repositories and are addressed by an identifier of the form
//! `<repo>tasks/<name>@<revision>`.
//!
//! # Components
//!
//! - **`identifier`** — Class identifier parsing and formatting
//! - **`class`** — The `TaskClass` model and its YAML definition format
//! - **`loader`** — Where definition text comes from (`FsClassLoader`)
//! - **`registry`** — The live set of classes tasks resolve through

pub mod class;
pub mod error;
pub mod identifier;
pub mod loader;
pub mod registry;

pub use class::{CommandInfo, Control, ControlMode, ResourceWants, TaskClass};
pub use error::{ClassError, ClassResult};
pub use identifier::{ClassIdentifier, canonical_name};
pub use loader::{ClassLoader, FsClassLoader, MemoryClassLoader};
pub use registry::{ClassLookup, ClassRegistry, RefreshSummary};
