//! Episode loop for learning and evaluation runs

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Result,
    agent::{EpisodeSummary, MdpAgent},
    ports::{Environment, Observer},
};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of episodes to play
    pub episodes: usize,

    /// Episodes longer than this are cut off and treated as finished
    pub max_steps_per_episode: Option<usize>,

    /// Reseeds the agent's exploration RNG before the run
    pub seed: Option<u64>,
}

impl TrainingConfig {
    pub fn new(episodes: usize) -> Self {
        Self {
            episodes,
            ..Self::default()
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps_per_episode = Some(max_steps);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 200,
            max_steps_per_episode: Some(10_000),
            seed: None,
        }
    }
}

/// Whether a run updates the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Epsilon-greedy play, transitions recorded, refit every episode
    Learn,
    /// Greedy play against a frozen model
    Evaluate,
}

/// Result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Episodes played
    pub episodes: usize,

    /// Environment steps over all episodes
    pub total_steps: usize,

    /// Longest episode
    pub best_score: usize,

    /// Average episode length
    pub mean_score: f64,

    /// Episodes that ended in a crash rather than the step cap
    pub crashes: usize,

    /// Refits whose value iteration hit the sweep cap
    pub unconverged_refits: usize,
}

impl TrainingResult {
    /// Summarize a run from its episode summaries.
    pub fn from_summaries(summaries: &[EpisodeSummary]) -> Self {
        let episodes = summaries.len();
        let total_steps: usize = summaries.iter().map(|s| s.steps).sum();
        let mean_score = if episodes > 0 {
            total_steps as f64 / episodes as f64
        } else {
            0.0
        };

        Self {
            episodes,
            total_steps,
            best_score: summaries.iter().map(|s| s.steps).max().unwrap_or(0),
            mean_score,
            crashes: summaries.iter().filter(|s| s.crashed).count(),
            unconverged_refits: summaries
                .iter()
                .filter_map(|s| s.refit)
                .filter(|r| !r.solve.converged)
                .count(),
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Drives an agent through whole episodes and reports to observers.
///
/// # Examples
///
/// ```
/// use dino_mdp::agent::MdpAgent;
/// use dino_mdp::app::AgentConfig;
/// use dino_mdp::env::{RunnerConfig, SimulatedRunner};
/// use dino_mdp::pipeline::{MetricsObserver, TrainingConfig, TrainingPipeline};
///
/// let mut agent = MdpAgent::new(AgentConfig::new().with_seed(1))?;
/// let mut env = SimulatedRunner::new(RunnerConfig::new().with_seed(2))?;
///
/// let mut pipeline = TrainingPipeline::new(TrainingConfig::new(5).with_max_steps(500))
///     .with_observer(Box::new(MetricsObserver::new()));
/// let result = pipeline.run(&mut agent, &mut env)?;
///
/// assert_eq!(result.episodes, 5);
/// assert_eq!(agent.episodes(), 5);
/// # Ok::<(), dino_mdp::Error>(())
/// ```
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train: epsilon-greedy play with a refit at every episode boundary.
    pub fn run(&mut self, agent: &mut MdpAgent, env: &mut dyn Environment) -> Result<TrainingResult> {
        self.execute(agent, env, RunMode::Learn)
    }

    /// Evaluate: greedy play, nothing recorded, no refits, epsilon unchanged.
    pub fn evaluate(
        &mut self,
        agent: &mut MdpAgent,
        env: &mut dyn Environment,
    ) -> Result<TrainingResult> {
        self.execute(agent, env, RunMode::Evaluate)
    }

    /// Run `config.episodes` episodes in the given mode.
    pub fn execute(
        &mut self,
        agent: &mut MdpAgent,
        env: &mut dyn Environment,
        mode: RunMode,
    ) -> Result<TrainingResult> {
        if let Some(seed) = self.config.seed {
            agent.set_rng_seed(seed);
        }

        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        env.start();
        agent.sync_state(env);

        let mut summaries = Vec::with_capacity(self.config.episodes);
        for _ in 0..self.config.episodes {
            let summary = self.play_episode(agent, env, mode)?;
            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }
            summaries.push(summary);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let result = TrainingResult::from_summaries(&summaries);
        debug!(
            ?mode,
            episodes = result.episodes,
            best_score = result.best_score,
            mean_score = result.mean_score,
            "run finished"
        );
        Ok(result)
    }

    fn play_episode(
        &mut self,
        agent: &mut MdpAgent,
        env: &mut dyn Environment,
        mode: RunMode,
    ) -> Result<EpisodeSummary> {
        let episode = agent.episodes();
        for observer in &mut self.observers {
            observer.on_episode_start(episode)?;
        }

        let mut step = 0;
        loop {
            let outcome = match mode {
                RunMode::Learn => {
                    agent.act(env)?;
                    env.advance();
                    agent.record_step(env)?
                }
                RunMode::Evaluate => {
                    agent.act_greedy(env)?;
                    env.advance();
                    agent.skip_step(env)?
                }
            };

            for observer in &mut self.observers {
                observer.on_step(episode, step, &outcome)?;
            }
            step += 1;

            let capped = self
                .config
                .max_steps_per_episode
                .is_some_and(|max| step >= max);
            if outcome.crashed || capped {
                break;
            }
        }

        match mode {
            RunMode::Learn => agent.end_episode(env),
            RunMode::Evaluate => agent.end_episode_frozen(env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::AgentConfig,
        env::{RunnerConfig, SimulatedRunner},
    };

    fn setup() -> (MdpAgent, SimulatedRunner) {
        let agent = MdpAgent::new(AgentConfig::new().with_seed(42)).unwrap();
        let env = SimulatedRunner::new(RunnerConfig::new().with_seed(7)).unwrap();
        (agent, env)
    }

    #[test]
    fn test_training_pipeline() {
        let (mut agent, mut env) = setup();
        let mut pipeline = TrainingPipeline::new(TrainingConfig::new(10).with_max_steps(2_000));

        let result = pipeline.run(&mut agent, &mut env).unwrap();

        assert_eq!(result.episodes, 10);
        assert_eq!(agent.episodes(), 10);
        assert!((agent.epsilon() - 1.1).abs() < 1e-9);
        assert_eq!(agent.model().total_transitions(), result.total_steps as u64);
        assert!(result.best_score as f64 >= result.mean_score);
    }

    #[test]
    fn test_evaluation_leaves_model_frozen() {
        let (mut agent, mut env) = setup();
        TrainingPipeline::new(TrainingConfig::new(3).with_max_steps(2_000))
            .run(&mut agent, &mut env)
            .unwrap();
        let model = agent.model().clone();
        let epsilon = agent.epsilon();

        let result = TrainingPipeline::new(TrainingConfig::new(4).with_max_steps(2_000))
            .evaluate(&mut agent, &mut env)
            .unwrap();

        assert_eq!(result.episodes, 4);
        assert_eq!(result.unconverged_refits, 0);
        assert_eq!(agent.model(), &model);
        assert_eq!(agent.epsilon(), epsilon);
    }

    #[test]
    fn test_step_cap_ends_episode() {
        let (mut agent, mut env) = setup();
        let result = TrainingPipeline::new(TrainingConfig::new(2).with_max_steps(5))
            .run(&mut agent, &mut env)
            .unwrap();
        assert!(result.best_score <= 5);
    }

    #[test]
    fn test_result_from_summaries() {
        let summary = |steps, crashed| EpisodeSummary {
            episode: 0,
            steps,
            crashed,
            epsilon: 1.0,
            refit: None,
        };
        let result = TrainingResult::from_summaries(&[summary(10, true), summary(30, false)]);
        assert_eq!(result.episodes, 2);
        assert_eq!(result.total_steps, 40);
        assert_eq!(result.best_score, 30);
        assert_eq!(result.mean_score, 20.0);
        assert_eq!(result.crashes, 1);

        let empty = TrainingResult::from_summaries(&[]);
        assert_eq!(empty.mean_score, 0.0);
    }
}
