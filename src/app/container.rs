//! Dependency injection container.

use std::{path::Path, sync::Arc};

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::MsgPackRepository,
    agent::MdpAgent,
    env::{RunnerConfig, SimulatedRunner},
    ports::AgentRepository,
    serialization::{SavedAgent, TrainingMetadata},
};

/// Application with dependency injection.
///
/// # Examples
///
/// ```no_run
/// use dino_mdp::app::{App, AgentConfig};
/// use dino_mdp::serialization::TrainingMetadata;
/// use std::path::Path;
///
/// let app = App::new();
/// let agent = app.create_agent(AgentConfig::new().with_seed(42))?;
///
/// // Train the agent...
///
/// app.save_agent(&agent, TrainingMetadata::default(), Path::new("dino.msgpack"))?;
/// # Ok::<(), dino_mdp::Error>(())
/// ```
pub struct App {
    agent_repository: Arc<dyn AgentRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// App with `MsgPackRepository` storage and no default seed.
    pub fn new() -> Self {
        Self {
            agent_repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Returns an Arc-wrapped repository that can be shared across threads.
    pub fn agent_repository(&self) -> Arc<dyn AgentRepository + Send + Sync> {
        Arc::clone(&self.agent_repository)
    }

    pub fn default_seed(&self) -> Option<u64> {
        self.default_seed
    }

    /// Create an agent with an empty model. A seed in `config` overrides the
    /// app default.
    pub fn create_agent(&self, mut config: AgentConfig) -> Result<MdpAgent> {
        if config.seed.is_none() {
            config.seed = self.default_seed;
        }
        MdpAgent::new(config)
    }

    /// Create a simulated runner, applying the app default seed if the
    /// configuration has none.
    pub fn create_runner(&self, mut config: RunnerConfig) -> Result<SimulatedRunner> {
        if config.seed.is_none() {
            config.seed = self.default_seed;
        }
        SimulatedRunner::new(config)
    }

    /// Load a snapshot without rebuilding the agent.
    pub fn load_snapshot(&self, path: &Path) -> Result<SavedAgent> {
        self.agent_repository.load(path)
    }

    /// Load an agent and resume it where it was saved: model, counts and
    /// epsilon included.
    pub fn load_agent(&self, path: &Path) -> Result<MdpAgent> {
        let mut agent = self.load_snapshot(path)?.to_agent()?;
        if let Some(seed) = self.default_seed {
            agent.set_rng_seed(seed);
        }
        Ok(agent)
    }

    pub fn save_agent(&self, agent: &MdpAgent, metadata: TrainingMetadata, path: &Path) -> Result<()> {
        self.agent_repository
            .save(&SavedAgent::from_agent(agent, metadata), path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// # Examples
///
/// ```
/// use dino_mdp::app::AppBuilder;
/// use dino_mdp::adapters::InMemoryRepository;
///
/// let app = AppBuilder::new()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct AppBuilder {
    agent_repository: Option<Arc<dyn AgentRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            agent_repository: None,
            default_seed: None,
        }
    }

    pub fn with_repository<R: AgentRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.agent_repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for all agents and runners created by this
    /// container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// If no repository was specified, uses `MsgPackRepository`.
    pub fn build(self) -> App {
        App {
            agent_repository: self
                .agent_repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
