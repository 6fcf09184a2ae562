//! Common test utilities for the dino-mdp test suite.
//!
//! Provides a scripted environment and helpers for building random models.

#![allow(dead_code)]

use dino_mdp::{
    Action, MdpModel, ObstacleType, Observation, StateIndex, mdp::CRASH_REWARD, ports::Environment,
};
use rand::{Rng, rngs::StdRng};

/// Environment that replays a fixed list of frames regardless of the agent's
/// commands. The runner crashes when the last frame is reached.
pub struct ScriptedRunner {
    frames: Vec<Option<Observation>>,
    cursor: usize,
    pub jumps: usize,
    pub ducks: usize,
    pub starts: usize,
}

impl ScriptedRunner {
    pub fn new(frames: Vec<Option<Observation>>) -> Self {
        assert!(!frames.is_empty(), "a script needs at least one frame");
        Self {
            frames,
            cursor: 0,
            jumps: 0,
            ducks: 0,
            starts: 0,
        }
    }

    /// Clear road, then a small cactus approaching until it hits.
    pub fn approaching_cactus(distances: &[f64]) -> Self {
        let mut frames = vec![None];
        frames.extend(distances.iter().map(|&dx| cactus(dx)));
        Self::new(frames)
    }
}

impl Environment for ScriptedRunner {
    fn get_state(&self) -> Option<Observation> {
        self.frames[self.cursor]
    }

    fn is_crashed(&self) -> bool {
        self.cursor + 1 == self.frames.len()
    }

    fn start(&mut self) {
        self.cursor = 0;
        self.starts += 1;
    }

    fn jump(&mut self) {
        self.jumps += 1;
    }

    fn duck(&mut self) {
        self.ducks += 1;
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.frames.len() - 1);
    }
}

pub fn cactus(dx: f64) -> Option<Observation> {
    Some(Observation::new(ObstacleType::SmallCactus, 1.0, dx))
}

pub fn pterodactyl(height: f64, dx: f64) -> Option<Observation> {
    Some(Observation::new(ObstacleType::Pterodactyl, height, dx))
}

pub fn approx_eq_tol(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Every `(state, action)` row of the model sums to one.
pub fn assert_row_stochastic(model: &MdpModel) {
    for s in 0..model.num_states() {
        for action in Action::ALL {
            let row = model.transition_probs(StateIndex::new(s), action);
            let sum: f64 = row.iter().sum();
            assert!(
                approx_eq_tol(sum, 1.0, 1e-9),
                "row ({s}, {action}) sums to {sum}"
            );
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }
}

/// Record `transitions` random transitions. Arriving in state 0 pays the
/// crash reward, anything else pays a reward in [-1, 1].
pub fn record_random(model: &mut MdpModel, transitions: usize, rng: &mut StdRng) {
    let n = model.num_states();
    for _ in 0..transitions {
        let s = StateIndex::new(rng.random_range(0..n));
        let action = Action::ALL[rng.random_range(0..Action::COUNT)];
        let next = StateIndex::new(rng.random_range(0..n));
        let reward = if next == StateIndex::FAIL {
            CRASH_REWARD
        } else {
            rng.random_range(-1.0..=1.0)
        };
        model.record(s, action, next, reward).unwrap();
    }
}
