//! Repository port for trained agent persistence.

use std::path::Path;

use crate::{Result, serialization::SavedAgent};

/// Port for persisting and loading trained agents.
///
/// The core leaves the storage format open; implementations decide how a
/// [`SavedAgent`] is encoded.
///
/// # Examples
///
/// ```no_run
/// use dino_mdp::ports::AgentRepository;
/// use dino_mdp::serialization::SavedAgent;
/// use std::path::Path;
///
/// fn checkpoint<R: AgentRepository>(repo: &R, saved: &SavedAgent) -> dino_mdp::Result<()> {
///     repo.save(saved, Path::new("checkpoint.msgpack"))
/// }
/// ```
pub trait AgentRepository {
    /// Save an agent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or serialization
    /// fails.
    fn save(&self, saved: &SavedAgent, path: &Path) -> Result<()>;

    /// Load an agent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the location does not exist, cannot be read or
    /// does not decode to a snapshot.
    fn load(&self, path: &Path) -> Result<SavedAgent>;
}
