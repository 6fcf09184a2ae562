//! MessagePack implementation of the agent repository.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{Result, error::Error, ports::AgentRepository, serialization::SavedAgent};

/// MessagePack-based agent repository.
///
/// The transition count tensor dominates a snapshot, and MessagePack keeps it
/// compact and fast to decode.
///
/// # Examples
///
/// ```no_run
/// use dino_mdp::adapters::MsgPackRepository;
/// use dino_mdp::agent::MdpAgent;
/// use dino_mdp::app::AgentConfig;
/// use dino_mdp::ports::AgentRepository;
/// use dino_mdp::serialization::{SavedAgent, TrainingMetadata};
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let agent = MdpAgent::new(AgentConfig::default())?;
/// let saved = SavedAgent::from_agent(&agent, TrainingMetadata::default());
///
/// repo.save(&saved, Path::new("dino.msgpack"))?;
/// let loaded = repo.load(Path::new("dino.msgpack"))?;
/// # Ok::<(), dino_mdp::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl AgentRepository for MsgPackRepository {
    fn save(&self, saved: &SavedAgent, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, saved).map_err(|e| Error::SerializationContext {
            operation: "serialize agent to MessagePack".to_string(),
            message: e.to_string(),
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {path:?}"),
            source,
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedAgent> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
            Error::SerializationContext {
                operation: "deserialize agent from MessagePack".to_string(),
                message: e.to_string(),
            }
        })
    }
}
