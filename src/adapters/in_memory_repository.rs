//! In-memory agent repository for testing.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{Result, error::Error, ports::AgentRepository, serialization::SavedAgent};

/// In-memory repository for testing.
///
/// Snapshots are still encoded to MessagePack bytes, so a round trip through
/// this repository exercises the same serialization as the file adapter.
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use dino_mdp::adapters::InMemoryRepository;
/// use dino_mdp::agent::MdpAgent;
/// use dino_mdp::app::AgentConfig;
/// use dino_mdp::ports::AgentRepository;
/// use dino_mdp::serialization::{SavedAgent, TrainingMetadata};
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let agent = MdpAgent::new(AgentConfig::default())?;
/// repo.save(&SavedAgent::from_agent(&agent, TrainingMetadata::default()), Path::new("a"))?;
/// let loaded = repo.load(Path::new("a"))?;
/// # Ok::<(), dino_mdp::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of snapshots currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(path.to_string_lossy().as_ref())
    }
}

impl AgentRepository for InMemoryRepository {
    fn save(&self, saved: &SavedAgent, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();

        let bytes = rmp_serde::to_vec(saved).map_err(|e| Error::SerializationContext {
            operation: "serialize agent for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(key, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedAgent> {
        let key = path.to_string_lossy().to_string();
        let storage = self.storage();

        let bytes = storage.get(&key).ok_or_else(|| Error::Io {
            operation: format!("load agent from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize agent from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }
}
