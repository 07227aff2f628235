//! Class definition sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::ClassError;
use crate::identifier::ClassIdentifier;

/// Supplies the raw definition text for a class.
///
/// Repository checkout and revision handling happen outside taskgrid; a
/// loader only reads what is already there.
pub trait ClassLoader: Send + Sync {
    fn load(&self, id: &ClassIdentifier) -> Result<String, ClassError>;
}

/// Reads definitions from `<root>/<repo>tasks/<name>.yaml`.
#[derive(Debug, Clone)]
pub struct FsClassLoader {
    root: PathBuf,
}

impl FsClassLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn definition_path(&self, id: &ClassIdentifier) -> PathBuf {
        self.root.join(id.definition_path())
    }
}

impl ClassLoader for FsClassLoader {
    fn load(&self, id: &ClassIdentifier) -> Result<String, ClassError> {
        let path = self.definition_path(id);
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ClassError::Read { path: path.clone(), source })?;
        debug!(class = %id, path = ?path, "class definition read");
        Ok(text)
    }
}

/// Serves definitions registered in memory, keyed by class identifier.
#[derive(Debug, Default)]
pub struct MemoryClassLoader {
    definitions: RwLock<HashMap<String, String>>,
}

impl MemoryClassLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the definition text for `class`.
    pub fn insert(&self, class: &str, text: impl Into<String>) -> Result<(), ClassError> {
        let id = ClassIdentifier::parse(class)?;
        self.definitions.write().insert(id.to_string(), text.into());
        Ok(())
    }
}

impl ClassLoader for MemoryClassLoader {
    fn load(&self, id: &ClassIdentifier) -> Result<String, ClassError> {
        let key = id.to_string();
        self.definitions
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| ClassError::Read {
                path: PathBuf::from(id.definition_path()),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such definition"),
            })
    }
}
