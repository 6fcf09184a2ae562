//! Transition/reward statistics and their maximum likelihood estimates

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    tensor::TransitionTensor,
    value_iteration::{SolveReport, ValueIteration},
};
use crate::{
    Error, Result,
    discretizer::StateDiscretizer,
    types::{Action, Observation, StateIndex},
};

/// Reward observed when arriving in the crash state.
pub const CRASH_REWARD: f64 = -1000.0;

/// Reward observed for every step survived.
pub const ALIVE_REWARD: f64 = 1.0;

/// Reward for a step, depending only on whether it ended in a crash.
pub fn step_reward(crashed: bool) -> f64 {
    if crashed { CRASH_REWARD } else { ALIVE_REWARD }
}

/// What a refit re-estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EstimateStats {
    /// State-action rows with at least one observed transition
    pub rows_updated: usize,
    /// Arrival states with at least one observed reward
    pub rewards_updated: usize,
}

/// Outcome of an episode-boundary refit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefitReport {
    pub estimate: EstimateStats,
    pub solve: SolveReport,
}

/// Approximate MDP over a fixed number of discrete states.
///
/// Counts grow monotonically and are never reset, so every refit is a running
/// average over the whole training history. Probabilities, rewards and values
/// only change when [`MdpModel::refit`] is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdpModel {
    num_states: usize,
    transition_counts: TransitionTensor<u64>,
    /// Sum over next states of `transition_counts`, one entry per row
    row_totals: Vec<u64>,
    transition_probs: TransitionTensor<f64>,
    reward_accum: Vec<f64>,
    reward_visits: Vec<u64>,
    reward: Vec<f64>,
    value: Vec<f64>,
}

impl MdpModel {
    /// Create a model with uniform transitions, zero rewards and zero values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `num_states` is zero.
    pub fn new(num_states: usize) -> Result<Self> {
        if num_states == 0 {
            return Err(Error::InvalidConfiguration {
                message: "an MDP needs at least one state".to_string(),
            });
        }

        Ok(Self {
            num_states,
            transition_counts: TransitionTensor::filled(num_states, 0),
            row_totals: vec![0; num_states * Action::COUNT],
            transition_probs: TransitionTensor::filled(num_states, 1.0 / num_states as f64),
            reward_accum: vec![0.0; num_states],
            reward_visits: vec![0; num_states],
            reward: vec![0.0; num_states],
            value: vec![0.0; num_states],
        })
    }

    /// Model sized for the given discretizer.
    pub fn for_discretizer(discretizer: &StateDiscretizer) -> Result<Self> {
        Self::new(discretizer.num_states())
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Check that every table is sized for `num_states` and that the cached
    /// row totals agree with the counts.
    ///
    /// Models built through [`MdpModel::new`] always pass; this guards
    /// models that were deserialized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] describing the first mismatch.
    pub fn validate_shape(&self) -> Result<()> {
        let n = self.num_states;
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        if n == 0 {
            return invalid("an MDP needs at least one state".to_string());
        }
        if !self.transition_counts.has_shape(n) {
            return invalid(format!("transition counts are not sized for {n} states"));
        }
        if !self.transition_probs.has_shape(n) {
            return invalid(format!("transition probabilities are not sized for {n} states"));
        }
        if self.row_totals.len() != n * Action::COUNT {
            return invalid(format!(
                "expected {} row totals, found {}",
                n * Action::COUNT,
                self.row_totals.len()
            ));
        }
        for (name, len) in [
            ("reward sums", self.reward_accum.len()),
            ("reward visits", self.reward_visits.len()),
            ("rewards", self.reward.len()),
            ("values", self.value.len()),
        ] {
            if len != n {
                return invalid(format!("expected {n} {name}, found {len}"));
            }
        }
        for (slot, (state, action, counts)) in self.transition_counts.rows().enumerate() {
            let sum: u64 = counts.iter().sum();
            if self.row_totals[slot] != sum {
                return invalid(format!(
                    "row total for state {state} {action} is {} but its counts sum to {sum}",
                    self.row_totals[slot]
                ));
            }
        }
        Ok(())
    }

    fn check_state(&self, state: StateIndex) -> Result<()> {
        if state.value() < self.num_states {
            Ok(())
        } else {
            Err(Error::StateOutOfRange {
                index: state.value(),
                num_states: self.num_states,
            })
        }
    }

    fn row_slot(state: StateIndex, action: Action) -> usize {
        state.value() * Action::COUNT + action.index()
    }

    /// Record one observed `(state, action, next_state)` transition and the
    /// reward received on arrival.
    pub fn record(&mut self, state: StateIndex, action: Action, next: StateIndex, reward: f64) -> Result<()> {
        self.check_state(state)?;
        self.check_state(next)?;

        *self.transition_counts.get_mut(state, action, next) += 1;
        self.row_totals[Self::row_slot(state, action)] += 1;

        let slot = next.value();
        self.reward_accum[slot] += reward;
        self.reward_visits[slot] += 1;
        Ok(())
    }

    /// Discretize both ends of an environment step and record it.
    ///
    /// The previous observation is never terminal; terminality belongs to the
    /// arrival state. Returns the recorded `(state, next_state)` pair.
    pub fn record_transition(
        &mut self,
        discretizer: &StateDiscretizer,
        previous: Option<&Observation>,
        action: Action,
        next: Option<&Observation>,
        reward: f64,
        terminal: bool,
    ) -> Result<(StateIndex, StateIndex)> {
        let s = discretizer.discretize(previous, false)?;
        let s_next = discretizer.discretize(next, terminal)?;
        self.record(s, action, s_next, reward)?;
        Ok((s, s_next))
    }

    /// Re-estimate transition probabilities and rewards from the counts.
    ///
    /// Rows and rewards that were never observed keep their previous values.
    pub fn estimate(&mut self) -> EstimateStats {
        let mut stats = EstimateStats::default();

        for s in 0..self.num_states {
            let state = StateIndex::new(s);
            for action in Action::ALL {
                let Some(total) = NonZeroU64::new(self.row_totals[Self::row_slot(state, action)])
                else {
                    continue;
                };
                let total = total.get() as f64;
                let counts = self.transition_counts.row(state, action);
                let probs = self.transition_probs.row_mut(state, action);
                for (p, &count) in probs.iter_mut().zip(counts) {
                    *p = count as f64 / total;
                }
                stats.rows_updated += 1;
            }
        }

        for s in 0..self.num_states {
            if let Some(visits) = NonZeroU64::new(self.reward_visits[s]) {
                self.reward[s] = self.reward_accum[s] / visits.get() as f64;
                stats.rewards_updated += 1;
            }
        }

        stats
    }

    /// Episode-boundary update: re-estimate the model, then solve for values.
    pub fn refit(&mut self, solver: &ValueIteration) -> RefitReport {
        let estimate = self.estimate();
        let solve = solver.solve(self);
        debug!(
            rows_updated = estimate.rows_updated,
            rewards_updated = estimate.rewards_updated,
            sweeps = solve.sweeps,
            residual = solve.residual,
            converged = solve.converged,
            "refit approximate MDP"
        );
        RefitReport { estimate, solve }
    }

    /// Estimated distribution over next states for `(state, action)`.
    pub fn transition_probs(&self, state: StateIndex, action: Action) -> &[f64] {
        self.transition_probs.row(state, action)
    }

    /// Raw count of an observed transition.
    pub fn transition_count(&self, state: StateIndex, action: Action, next: StateIndex) -> u64 {
        *self.transition_counts.get(state, action, next)
    }

    /// Number of times `action` was recorded in `state`.
    pub fn visits(&self, state: StateIndex, action: Action) -> u64 {
        self.row_totals[Self::row_slot(state, action)]
    }

    /// Total number of recorded transitions.
    pub fn total_transitions(&self) -> u64 {
        self.row_totals.iter().sum()
    }

    /// State-action rows with at least one observed transition.
    pub fn visited_rows(&self) -> usize {
        self.row_totals.iter().filter(|&&total| total > 0).count()
    }

    pub fn rewards(&self) -> &[f64] {
        &self.reward
    }

    pub fn reward(&self, state: StateIndex) -> f64 {
        self.reward[state.value()]
    }

    pub fn reward_visits(&self, state: StateIndex) -> u64 {
        self.reward_visits[state.value()]
    }

    pub fn values(&self) -> &[f64] {
        &self.value
    }

    pub fn value(&self, state: StateIndex) -> f64 {
        self.value[state.value()]
    }

    pub(crate) fn set_values(&mut self, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.num_states);
        self.value = values;
    }

    /// Expected next-state value of taking `action` in `state`.
    pub fn action_value(&self, state: StateIndex, action: Action) -> f64 {
        dot(self.transition_probs(state, action), &self.value)
    }
}

pub(crate) fn dot(row: &[f64], values: &[f64]) -> f64 {
    row.iter().zip(values).map(|(p, v)| p * v).sum()
}
