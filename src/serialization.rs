//! Snapshot format for trained agents.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    agent::{AgentState, MdpAgent},
    app::AgentConfig,
    mdp::MdpModel,
};

/// Context recorded alongside a trained model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Number of episodes trained in the run that produced the snapshot
    pub episodes_trained: Option<usize>,
    /// Longest episode seen during training
    pub best_score: Option<usize>,
    /// Random seed used (if any)
    pub seed: Option<u64>,
    /// Timestamp when saved
    pub saved_at: Option<String>,
}

/// Versioned snapshot of an [`MdpAgent`].
///
/// Stores the configuration, the full model (counts included, so training
/// can resume) and the current epsilon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAgent {
    pub version: u32,
    state: AgentState,
    pub metadata: TrainingMetadata,
}

impl SavedAgent {
    /// Current save format version
    pub const VERSION: u32 = 1;

    pub fn from_agent(agent: &MdpAgent, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            state: agent.export_state(),
            metadata,
        }
    }

    /// Rebuild the agent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSaveVersion`] for snapshots written by a
    /// different format version, or [`Error::InvalidConfiguration`] if the
    /// stored model does not match the stored configuration.
    pub fn to_agent(&self) -> Result<MdpAgent> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedSaveVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        MdpAgent::from_state(self.state.clone())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.state.config
    }

    pub fn model(&self) -> &MdpModel {
        &self.state.model
    }

    pub fn epsilon(&self) -> f64 {
        self.state.epsilon
    }

    /// Episodes completed over the agent's whole lifetime.
    pub fn episodes(&self) -> usize {
        self.state.episodes
    }
}
