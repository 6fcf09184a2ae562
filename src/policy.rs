//! Epsilon-greedy action selection over the planned value function
//!
//! Epsilon here is the probability of acting *greedily*. It starts at the
//! configured initial value and grows by a fixed step after every episode
//! without an upper bound, so once it passes 1.0 the exploration branch can no
//! longer be taken.
//!
//! The exploration branch itself is biased: it jumps with a small fixed
//! probability and otherwise does nothing. Ducking is only ever chosen
//! greedily.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    mdp::MdpModel,
    types::{Action, StateIndex},
};

/// Expected next-state value of each action in a state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    pub none: f64,
    pub jump: f64,
    pub duck: f64,
}

impl ActionValues {
    /// Score every action in `state` against the model's value function.
    pub fn of(model: &MdpModel, state: StateIndex) -> Self {
        Self {
            none: model.action_value(state, Action::None),
            jump: model.action_value(state, Action::Jump),
            duck: model.action_value(state, Action::Duck),
        }
    }

    /// Greedy choice. Doing nothing wins every tie and every case where no
    /// action strictly beats it; a jump beats a duck on equal scores.
    pub fn best(&self) -> Action {
        if self.jump > self.none && self.jump >= self.duck {
            Action::Jump
        } else if self.duck > self.none && self.duck > self.jump {
            Action::Duck
        } else {
            Action::None
        }
    }
}

/// Greedy action in `state` according to the model.
pub fn best_action(model: &MdpModel, state: StateIndex) -> Action {
    ActionValues::of(model, state).best()
}

/// Epsilon-greedy selector with an additive, unclamped epsilon schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    epsilon: f64,
    step: f64,
    explore_jump_probability: f64,
}

impl EpsilonGreedy {
    pub const DEFAULT_STEP: f64 = 0.01;
    pub const DEFAULT_EXPLORE_JUMP_PROBABILITY: f64 = 0.01;

    /// Create a selector.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Initial probability of acting greedily
    /// * `step` - Amount added to epsilon after every episode
    /// * `explore_jump_probability` - Chance that an exploratory step jumps
    pub fn new(epsilon: f64, step: f64, explore_jump_probability: f64) -> Self {
        Self {
            epsilon,
            step,
            explore_jump_probability,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn explore_jump_probability(&self) -> f64 {
        self.explore_jump_probability
    }

    pub(crate) fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    /// Choose an action for `state`.
    pub fn choose<R: Rng + ?Sized>(&self, model: &MdpModel, state: StateIndex, rng: &mut R) -> Action {
        if rng.random::<f64>() < self.epsilon {
            best_action(model, state)
        } else if rng.random::<f64>() < self.explore_jump_probability {
            Action::Jump
        } else {
            Action::None
        }
    }

    /// Make the policy greedier after an episode.
    pub fn advance_episode(&mut self) {
        self.epsilon += self.step;
    }
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self::new(1.0, Self::DEFAULT_STEP, Self::DEFAULT_EXPLORE_JUMP_PROBABILITY)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::mdp::{ALIVE_REWARD, CRASH_REWARD, ValueIteration};

    fn scores(none: f64, jump: f64, duck: f64) -> ActionValues {
        ActionValues { none, jump, duck }
    }

    #[test]
    fn test_best_tie_breaks() {
        assert_eq!(scores(1.0, 1.0, 1.0).best(), Action::None);
        assert_eq!(scores(1.0, 2.0, 2.0).best(), Action::Jump);
        assert_eq!(scores(1.0, 0.0, 2.0).best(), Action::Duck);
        assert_eq!(scores(3.0, 2.0, 2.0).best(), Action::None);
        assert_eq!(scores(1.0, 1.0, 0.5).best(), Action::None);
    }

    /// In state 1 jumping keeps the runner alive and doing nothing crashes.
    fn jump_model() -> MdpModel {
        let mut model = MdpModel::new(3).unwrap();
        let (fail, s, alive) = (StateIndex::new(0), StateIndex::new(1), StateIndex::new(2));
        model.record(s, Action::Jump, alive, ALIVE_REWARD).unwrap();
        model.record(s, Action::None, fail, CRASH_REWARD).unwrap();
        model.record(s, Action::Duck, fail, CRASH_REWARD).unwrap();
        for action in Action::ALL {
            model.record(alive, action, alive, ALIVE_REWARD).unwrap();
            model.record(fail, action, fail, CRASH_REWARD).unwrap();
        }
        model.refit(&ValueIteration::new(0.9, 1e-6));
        model
    }

    #[test]
    fn test_greedy_picks_surviving_action() {
        let model = jump_model();
        assert_eq!(best_action(&model, StateIndex::new(1)), Action::Jump);
    }

    #[test]
    fn test_fresh_model_defaults_to_none() {
        let model = MdpModel::new(5).unwrap();
        assert_eq!(best_action(&model, StateIndex::new(3)), Action::None);
    }

    #[test]
    fn test_epsilon_of_one_is_always_greedy() {
        let model = jump_model();
        let policy = EpsilonGreedy::new(1.0, 0.01, 1.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            assert_eq!(policy.choose(&model, StateIndex::new(1), &mut rng), Action::Jump);
        }
    }

    #[test]
    fn test_exploration_never_ducks() {
        let model = MdpModel::new(3).unwrap();
        let policy = EpsilonGreedy::new(0.0, 0.01, 0.5);
        let mut rng = StdRng::seed_from_u64(17);
        let mut jumps = 0;
        for _ in 0..1000 {
            match policy.choose(&model, StateIndex::new(1), &mut rng) {
                Action::Jump => jumps += 1,
                Action::None => {}
                Action::Duck => panic!("exploration must not duck"),
            }
        }
        assert!(jumps > 300 && jumps < 700, "jumps = {jumps}");
    }

    #[test]
    fn test_advance_episode_is_additive_and_unclamped() {
        let mut policy = EpsilonGreedy::default();
        for _ in 0..150 {
            policy.advance_episode();
        }
        assert!((policy.epsilon() - 2.5).abs() < 1e-9);
    }
}
