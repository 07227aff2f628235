//! taskgrid.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_REPOSITORIES_PATH: &str = "/var/lib/taskgrid/repos";

/// Settings for a task manager.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Timeouts are in seconds; `0` waits indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Root under which class definition repositories are checked out.
    pub repositories_path: PathBuf,
    /// Bound on the revive-offers handshake.
    pub revive_timeout_secs: u64,
    /// Bound on handing off descriptors and receiving the deployment result.
    pub deploy_timeout_secs: u64,
    /// Bound on waiting for a transition command response.
    pub command_timeout_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            repositories_path: PathBuf::from(DEFAULT_REPOSITORIES_PATH),
            revive_timeout_secs: 30,
            deploy_timeout_secs: 120,
            command_timeout_secs: 60,
        }
    }
}

impl ManagerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ManagerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn revive_timeout(&self) -> Option<Duration> {
        bound(self.revive_timeout_secs)
    }

    pub fn deploy_timeout(&self) -> Option<Duration> {
        bound(self.deploy_timeout_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        bound(self.command_timeout_secs)
    }
}

fn bound(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ManagerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ManagerConfig::default());
        assert_eq!(config.revive_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_timeout_is_unbounded() {
        let config: ManagerConfig = toml::from_str("command_timeout_secs = 0").unwrap();
        assert_eq!(config.command_timeout(), None);
        assert_eq!(config.deploy_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn parse_repositories_path() {
        let config: ManagerConfig =
            toml::from_str(r#"repositories_path = "/srv/repos""#).unwrap();
        assert_eq!(config.repositories_path, PathBuf::from("/srv/repos"));
    }

    #[test]
    fn from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskgrid.toml");
        let config = ManagerConfig {
            deploy_timeout_secs: 5,
            ..ManagerConfig::default()
        };
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = ManagerConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
