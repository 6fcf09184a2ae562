//! Agent controller
//!
//! Owns the approximate MDP and drives the per-step loop against an
//! [`Environment`]:
//!
//! 1. [`MdpAgent::act`] - discretize the current observation, choose an action
//!    and issue it
//! 2. the environment advances
//! 3. [`MdpAgent::record_step`] - read the new observation and crash flag,
//!    record the transition and move on
//!
//! At the end of each episode [`MdpAgent::end_episode`] refits the model,
//! makes the policy greedier and restarts the game.

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Error, Result,
    app::AgentConfig,
    discretizer::StateDiscretizer,
    mdp::{MdpModel, RefitReport, ValueIteration, step_reward},
    policy::{EpsilonGreedy, best_action},
    ports::Environment,
    types::{Action, Observation, StateIndex},
};

/// One recorded environment step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub from: StateIndex,
    pub action: Action,
    pub to: StateIndex,
    pub reward: f64,
    pub crashed: bool,
}

/// What happened in a finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Index of the episode (0-based over the agent's lifetime)
    pub episode: usize,
    /// Steps survived
    pub steps: usize,
    /// Whether the episode ended in a crash rather than a step cap
    pub crashed: bool,
    /// Epsilon the episode was played with
    pub epsilon: f64,
    /// Refit performed at the episode boundary, if the agent was learning
    pub refit: Option<RefitReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AgentState {
    pub config: AgentConfig,
    pub model: MdpModel,
    pub epsilon: f64,
    pub episodes: usize,
}

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Model-based learning agent.
#[derive(Debug, Clone)]
pub struct MdpAgent {
    config: AgentConfig,
    discretizer: StateDiscretizer,
    model: MdpModel,
    solver: ValueIteration,
    policy: EpsilonGreedy,
    current: Option<Observation>,
    action: Action,
    episodes: usize,
    episode_steps: usize,
    last_crashed: bool,
    rng: StdRng,
}

impl MdpAgent {
    /// Create an agent with an empty model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the configuration
    /// does not validate.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let discretizer = config.discretizer()?;
        let model = MdpModel::for_discretizer(&discretizer)?;
        Ok(Self::assemble(config, discretizer, model))
    }

    fn assemble(config: AgentConfig, discretizer: StateDiscretizer, model: MdpModel) -> Self {
        Self {
            solver: config.solver(),
            policy: config.policy(),
            rng: build_rng(config.seed),
            config,
            discretizer,
            model,
            current: None,
            action: Action::None,
            episodes: 0,
            episode_steps: 0,
            last_crashed: false,
        }
    }

    /// Reseed the exploration RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_rng_seed(seed);
        self
    }

    pub fn set_rng_seed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub(crate) fn export_state(&self) -> AgentState {
        AgentState {
            config: self.config.clone(),
            model: self.model.clone(),
            epsilon: self.policy.epsilon(),
            episodes: self.episodes,
        }
    }

    pub(crate) fn from_state(state: AgentState) -> Result<Self> {
        state.config.validate()?;
        let discretizer = state.config.discretizer()?;
        state.model.validate_shape()?;
        if discretizer.num_states() != state.model.num_states() {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "saved model has {} states but the configuration implies {}",
                    state.model.num_states(),
                    discretizer.num_states()
                ),
            });
        }
        let mut agent = Self::assemble(state.config, discretizer, state.model);
        agent.policy.set_epsilon(state.epsilon);
        agent.episodes = state.episodes;
        Ok(agent)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn model(&self) -> &MdpModel {
        &self.model
    }

    pub fn discretizer(&self) -> &StateDiscretizer {
        &self.discretizer
    }

    pub fn epsilon(&self) -> f64 {
        self.policy.epsilon()
    }

    /// Number of completed episodes.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Action issued on the last step.
    pub fn current_action(&self) -> Action {
        self.action
    }

    /// Last observation the agent acted on.
    pub fn current_observation(&self) -> Option<&Observation> {
        self.current.as_ref()
    }

    /// Read the environment's current observation, e.g. after construction or
    /// after the game was started externally.
    pub fn sync_state(&mut self, env: &dyn Environment) {
        self.current = env.get_state();
    }

    /// Discretized current state.
    pub fn current_state(&self) -> Result<StateIndex> {
        self.discretizer.discretize(self.current.as_ref(), false)
    }

    /// Choose an epsilon-greedy action for the current observation and issue it.
    pub fn act(&mut self, env: &mut dyn Environment) -> Result<Action> {
        let state = self.current_state()?;
        self.action = self.policy.choose(&self.model, state, &mut self.rng);
        env.perform(self.action);
        Ok(self.action)
    }

    /// Choose the greedy action for the current observation and issue it.
    pub fn act_greedy(&mut self, env: &mut dyn Environment) -> Result<Action> {
        let state = self.current_state()?;
        self.action = best_action(&self.model, state);
        env.perform(self.action);
        Ok(self.action)
    }

    /// Read the environment after it advanced and record the transition.
    pub fn record_step(&mut self, env: &dyn Environment) -> Result<StepOutcome> {
        self.observe(env, true)
    }

    /// Advance past an environment step without recording it.
    pub fn skip_step(&mut self, env: &dyn Environment) -> Result<StepOutcome> {
        self.observe(env, false)
    }

    fn observe(&mut self, env: &dyn Environment, learn: bool) -> Result<StepOutcome> {
        let crashed = env.is_crashed();
        let next = env.get_state();
        let reward = step_reward(crashed);

        let (from, to) = if learn {
            self.model.record_transition(
                &self.discretizer,
                self.current.as_ref(),
                self.action,
                next.as_ref(),
                reward,
                crashed,
            )?
        } else {
            (
                self.discretizer.discretize(self.current.as_ref(), false)?,
                self.discretizer.discretize(next.as_ref(), crashed)?,
            )
        };

        self.current = next;
        self.episode_steps += 1;
        self.last_crashed = crashed;

        Ok(StepOutcome {
            from,
            action: self.action,
            to,
            reward,
            crashed,
        })
    }

    /// Re-estimate the model from all counts so far and re-plan.
    pub fn refit(&mut self) -> RefitReport {
        let report = self.model.refit(&self.solver);
        if !report.solve.converged {
            warn!(
                episode = self.episodes,
                sweeps = report.solve.sweeps,
                "keeping value function from an unconverged solve"
            );
        }
        report
    }

    /// Episode boundary: refit, make the policy greedier, restart the game.
    pub fn end_episode(&mut self, env: &mut dyn Environment) -> Result<EpisodeSummary> {
        let epsilon = self.policy.epsilon();
        let refit = self.refit();
        self.policy.advance_episode();
        Ok(self.finish_episode(env, epsilon, Some(refit)))
    }

    /// Episode boundary for a frozen agent: restart the game only.
    pub fn end_episode_frozen(&mut self, env: &mut dyn Environment) -> Result<EpisodeSummary> {
        let epsilon = self.policy.epsilon();
        Ok(self.finish_episode(env, epsilon, None))
    }

    fn finish_episode(
        &mut self,
        env: &mut dyn Environment,
        epsilon: f64,
        refit: Option<RefitReport>,
    ) -> EpisodeSummary {
        let summary = EpisodeSummary {
            episode: self.episodes,
            steps: self.episode_steps,
            crashed: self.last_crashed,
            epsilon,
            refit,
        };
        debug!(
            episode = summary.episode,
            steps = summary.steps,
            epsilon = summary.epsilon,
            "episode finished"
        );

        self.episodes += 1;
        self.episode_steps = 0;
        self.last_crashed = false;
        self.action = Action::None;
        env.start();
        self.sync_state(env);
        summary
    }
}
