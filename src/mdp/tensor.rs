//! Fixed-shape `[state][action][next_state]` storage

use serde::{Deserialize, Serialize};

use crate::types::{Action, StateIndex};

/// Dense tensor indexed by `(state, action, next_state)`.
///
/// Rows (one per state-action pair) are contiguous, so a row can be borrowed
/// as a slice over next states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionTensor<T> {
    num_states: usize,
    data: Vec<T>,
}

impl<T: Clone> TransitionTensor<T> {
    /// Tensor with every entry set to `fill`.
    pub fn filled(num_states: usize, fill: T) -> Self {
        Self {
            num_states,
            data: vec![fill; num_states * Action::COUNT * num_states],
        }
    }
}

impl<T> TransitionTensor<T> {
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Whether the backing storage holds exactly one row per state-action
    /// pair, each `num_states` long.
    pub fn has_shape(&self, num_states: usize) -> bool {
        self.num_states == num_states && self.data.len() == num_states * Action::COUNT * num_states
    }

    fn row_start(&self, state: StateIndex, action: Action) -> usize {
        (state.value() * Action::COUNT + action.index()) * self.num_states
    }

    /// Distribution row over next states for `(state, action)`.
    pub fn row(&self, state: StateIndex, action: Action) -> &[T] {
        let start = self.row_start(state, action);
        &self.data[start..start + self.num_states]
    }

    pub fn row_mut(&mut self, state: StateIndex, action: Action) -> &mut [T] {
        let start = self.row_start(state, action);
        let end = start + self.num_states;
        &mut self.data[start..end]
    }

    pub fn get(&self, state: StateIndex, action: Action, next: StateIndex) -> &T {
        &self.row(state, action)[next.value()]
    }

    pub fn get_mut(&mut self, state: StateIndex, action: Action, next: StateIndex) -> &mut T {
        &mut self.row_mut(state, action)[next.value()]
    }

    /// Iterate over `(state, action, row)` for every row.
    pub fn rows(&self) -> impl Iterator<Item = (StateIndex, Action, &[T])> + '_ {
        let n = self.num_states;
        self.data.chunks(n.max(1)).enumerate().map(move |(i, row)| {
            (
                StateIndex::new(i / Action::COUNT),
                Action::ALL[i % Action::COUNT],
                row,
            )
        })
    }
}
