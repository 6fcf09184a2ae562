//! Configuration types for agent creation.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    discretizer::StateDiscretizer,
    mdp::{BackupActions, ValueIteration},
    policy::EpsilonGreedy,
};

/// Configuration for creating an MDP agent.
///
/// Builder-style API; every field has a working default.
///
/// # Examples
///
/// ```
/// use dino_mdp::app::AgentConfig;
/// use dino_mdp::mdp::BackupActions;
///
/// let config = AgentConfig::new()
///     .with_gamma(0.9)
///     .with_distance_buckets(30, 750.0)
///     .with_backup(BackupActions::All)
///     .with_seed(42);
/// config.validate()?;
/// # Ok::<(), dino_mdp::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Discount factor γ, in (0, 1)
    pub gamma: f64,
    /// Value iteration stops once the largest update is below this
    pub tolerance: f64,
    /// Number of distance buckets
    pub n_x: usize,
    /// Largest distance covered by the distance grid
    pub max_dx: f64,
    /// Initial probability of acting greedily
    pub initial_epsilon: f64,
    /// Added to epsilon after every episode
    pub epsilon_step: f64,
    /// Chance that an exploratory step jumps
    pub explore_jump_probability: f64,
    /// Sweep cap for value iteration
    pub max_sweeps: usize,
    /// Actions maximized over during planning
    pub backup: BackupActions,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self {
            gamma: 0.95,
            tolerance: 0.01,
            n_x: 20,
            max_dx: 600.0,
            initial_epsilon: 1.0,
            epsilon_step: EpsilonGreedy::DEFAULT_STEP,
            explore_jump_probability: EpsilonGreedy::DEFAULT_EXPLORE_JUMP_PROBABILITY,
            max_sweeps: ValueIteration::DEFAULT_MAX_SWEEPS,
            backup: BackupActions::default(),
            seed: None,
        }
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the distance grid: `n_x` points spanning `[0, max_dx]`.
    pub fn with_distance_buckets(mut self, n_x: usize, max_dx: f64) -> Self {
        self.n_x = n_x;
        self.max_dx = max_dx;
        self
    }

    pub fn with_initial_epsilon(mut self, epsilon: f64) -> Self {
        self.initial_epsilon = epsilon;
        self
    }

    pub fn with_epsilon_step(mut self, step: f64) -> Self {
        self.epsilon_step = step;
        self
    }

    pub fn with_explore_jump_probability(mut self, probability: f64) -> Self {
        self.explore_jump_probability = probability;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn with_backup(mut self, backup: BackupActions) -> Self {
        self.backup = backup;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every parameter is within its domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return invalid(format!("gamma must be in (0, 1), got {}", self.gamma));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return invalid(format!("tolerance must be positive, got {}", self.tolerance));
        }
        if self.n_x == 0 {
            return invalid("n_x must be at least 1".to_string());
        }
        if !(self.max_dx.is_finite() && self.max_dx > 0.0) {
            return invalid(format!("max_dx must be positive, got {}", self.max_dx));
        }
        if !self.initial_epsilon.is_finite() || self.initial_epsilon < 0.0 {
            return invalid(format!(
                "initial epsilon must be non-negative, got {}",
                self.initial_epsilon
            ));
        }
        if !self.epsilon_step.is_finite() || self.epsilon_step < 0.0 {
            return invalid(format!(
                "epsilon step must be non-negative, got {}",
                self.epsilon_step
            ));
        }
        if !(0.0..=1.0).contains(&self.explore_jump_probability) {
            return invalid(format!(
                "explore jump probability must be in [0, 1], got {}",
                self.explore_jump_probability
            ));
        }
        if self.max_sweeps == 0 {
            return invalid("max_sweeps must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn discretizer(&self) -> Result<StateDiscretizer> {
        StateDiscretizer::new(self.n_x, self.max_dx)
    }

    pub fn solver(&self) -> ValueIteration {
        ValueIteration::new(self.gamma, self.tolerance)
            .with_max_sweeps(self.max_sweeps)
            .with_backup(self.backup)
    }

    pub fn policy(&self) -> EpsilonGreedy {
        EpsilonGreedy::new(
            self.initial_epsilon,
            self.epsilon_step,
            self.explore_jump_probability,
        )
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}
