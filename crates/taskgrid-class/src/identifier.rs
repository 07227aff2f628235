//! Class identifiers.
//!
//! `github.com/org/workflows/tasks/readout@v1.2` names the class `readout`
//! in repository `github.com/org/workflows/` at revision `v1.2`. Without an
//! explicit revision the identifier resolves to `@master`.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ClassError;

const TASKS_DIR: &str = "tasks/";
const DEFAULT_REVISION: &str = "master";

/// Fully qualified identifier of a task class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassIdentifier {
    /// Repository identifier, always ending in `/`.
    pub repo: String,
    pub name: String,
    /// Pinned revision, if any.
    pub revision: Option<String>,
}

impl ClassIdentifier {
    pub fn parse(raw: &str) -> Result<Self, ClassError> {
        let invalid = || ClassError::InvalidIdentifier(raw.to_string());

        let raw = raw.trim();
        let (path, revision) = match raw.rsplit_once('@') {
            Some((path, rev)) if !rev.is_empty() => (path, Some(rev.to_string())),
            Some((path, _)) => (path, None),
            None => (raw, None),
        };

        let (repo, name) = path.rsplit_once(TASKS_DIR).ok_or_else(invalid)?;
        if repo.is_empty() || !repo.ends_with('/') {
            return Err(invalid());
        }
        if name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            repo: repo.to_string(),
            name: name.to_string(),
            revision,
        })
    }

    /// The revision this identifier resolves to.
    pub fn revision(&self) -> &str {
        self.revision.as_deref().unwrap_or(DEFAULT_REVISION)
    }

    /// Path of the definition file relative to the repositories root.
    pub fn definition_path(&self) -> String {
        format!(
            "{}{}{}.yaml",
            self.repo.trim_start_matches('/'),
            TASKS_DIR,
            self.name
        )
    }
}

impl fmt::Display for ClassIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}@{}", self.repo, TASKS_DIR, self.name, self.revision())
    }
}

impl FromStr for ClassIdentifier {
    type Err = ClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ClassIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The registry key for a class name.
///
/// Names that parse as identifiers are normalized (so `…/tasks/x` and
/// `…/tasks/x@master` are the same class); anything else is kept verbatim.
pub fn canonical_name(name: &str) -> String {
    ClassIdentifier::parse(name)
        .map(|id| id.to_string())
        .unwrap_or_else(|_| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pinned_revision() {
        let id = ClassIdentifier::parse("github.com/org/wf/tasks/readout@v1.2").unwrap();
        assert_eq!(id.repo, "github.com/org/wf/");
        assert_eq!(id.name, "readout");
        assert_eq!(id.revision(), "v1.2");
        assert_eq!(id.to_string(), "github.com/org/wf/tasks/readout@v1.2");
    }

    #[test]
    fn missing_revision_formats_as_master() {
        let id = ClassIdentifier::parse("github.com/org/wf/tasks/readout").unwrap();
        assert!(id.revision.is_none());
        assert_eq!(id.to_string(), "github.com/org/wf/tasks/readout@master");
    }

    #[test]
    fn trailing_at_is_unpinned() {
        let id = ClassIdentifier::parse("repo/tasks/stfb@").unwrap();
        assert_eq!(id.to_string(), "repo/tasks/stfb@master");
    }

    #[test]
    fn rejects_missing_tasks_segment() {
        assert!(ClassIdentifier::parse("github.com/org/wf/readout").is_err());
    }

    #[test]
    fn rejects_empty_repo_or_name() {
        assert!(ClassIdentifier::parse("tasks/readout").is_err());
        assert!(ClassIdentifier::parse("repo/tasks/").is_err());
        assert!(ClassIdentifier::parse("repo/tasks/a/b").is_err());
    }

    #[test]
    fn definition_path_is_relative() {
        let id = ClassIdentifier::parse("/abs/repo/tasks/qc@v2").unwrap();
        assert_eq!(id.definition_path(), "abs/repo/tasks/qc.yaml");
    }

    #[test]
    fn canonical_name_normalizes_master() {
        assert_eq!(canonical_name("repo/tasks/qc"), "repo/tasks/qc@master");
        assert_eq!(canonical_name("repo/tasks/qc@master"), "repo/tasks/qc@master");
        assert_eq!(canonical_name("plain-name"), "plain-name");
    }
}
