pub mod class;

use std::path::Path;

use taskgrid_core::ManagerConfig;

/// Read the configuration file, or fall back to defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ManagerConfig> {
    match path {
        Some(path) => ManagerConfig::from_file(path),
        None => Ok(ManagerConfig::default()),
    }
}
