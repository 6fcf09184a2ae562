//! Synchronous value iteration over the estimated model

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::{MdpModel, dot};
use crate::{
    Error, Result,
    types::{Action, StateIndex},
};

/// Actions maximized over in the Bellman backup.
///
/// The default leaves `Duck` out of planning even though its transitions are
/// estimated and the greedy policy still scores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupActions {
    #[default]
    NoneAndJump,
    All,
}

impl BackupActions {
    pub fn actions(self) -> &'static [Action] {
        match self {
            BackupActions::NoneAndJump => &[Action::None, Action::Jump],
            BackupActions::All => &Action::ALL,
        }
    }
}

/// Result of a [`ValueIteration::solve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Whether the residual dropped below the tolerance
    pub converged: bool,
    /// Number of sweeps performed
    pub sweeps: usize,
    /// Largest absolute value change in the last sweep
    pub residual: f64,
    /// Tolerance the residual was compared against
    pub tolerance: f64,
}

impl SolveReport {
    /// Promote a non-converged solve to an error.
    pub fn into_result(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(Error::ValueIterationDidNotConverge {
                sweeps: self.sweeps,
                residual: self.residual,
                tolerance: self.tolerance,
            })
        }
    }
}

/// Jacobi-style value iteration with a sweep cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueIteration {
    gamma: f64,
    tolerance: f64,
    max_sweeps: usize,
    backup: BackupActions,
}

impl ValueIteration {
    pub const DEFAULT_MAX_SWEEPS: usize = 10_000;

    /// Solver with the default sweep cap and the `{None, Jump}` backup.
    pub fn new(gamma: f64, tolerance: f64) -> Self {
        Self {
            gamma,
            tolerance,
            max_sweeps: Self::DEFAULT_MAX_SWEEPS,
            backup: BackupActions::default(),
        }
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn with_backup(mut self, backup: BackupActions) -> Self {
        self.backup = backup;
        self
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_sweeps(&self) -> usize {
        self.max_sweeps
    }

    pub fn backup(&self) -> BackupActions {
        self.backup
    }

    /// One Bellman backup of every state.
    ///
    /// Reads only `current` and writes only `next`, so all states in a sweep
    /// see the previous sweep's values. Returns `max_s |next[s] - current[s]|`.
    pub fn sweep(&self, model: &MdpModel, current: &[f64], next: &mut [f64]) -> f64 {
        debug_assert_eq!(current.len(), model.num_states());
        debug_assert_eq!(next.len(), model.num_states());

        let actions = self.backup.actions();
        let mut residual = 0.0_f64;
        for (s, slot) in next.iter_mut().enumerate() {
            let state = StateIndex::new(s);
            let best = actions
                .iter()
                .map(|&action| dot(model.transition_probs(state, action), current))
                .fold(f64::NEG_INFINITY, f64::max);
            *slot = model.reward(state) + self.gamma * best;
            residual = residual.max((*slot - current[s]).abs());
        }
        residual
    }

    /// Iterate sweeps from the model's current values until the residual is
    /// below the tolerance or the sweep cap is reached, then store the result
    /// in the model.
    pub fn solve(&self, model: &mut MdpModel) -> SolveReport {
        let mut value = model.values().to_vec();
        let mut next = vec![0.0; value.len()];
        let mut sweeps = 0;
        let mut residual = f64::INFINITY;
        let mut converged = false;

        while sweeps < self.max_sweeps {
            residual = self.sweep(model, &value, &mut next);
            std::mem::swap(&mut value, &mut next);
            sweeps += 1;

            if residual < self.tolerance {
                converged = true;
                break;
            }
            if !residual.is_finite() {
                break;
            }
        }

        if !converged {
            warn!(
                sweeps,
                residual,
                tolerance = self.tolerance,
                gamma = self.gamma,
                "value iteration stopped before converging"
            );
        }

        model.set_values(value);
        SolveReport {
            converged,
            sweeps,
            residual,
            tolerance: self.tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::model::{ALIVE_REWARD, CRASH_REWARD};

    fn idx(i: usize) -> StateIndex {
        StateIndex::new(i)
    }

    /// Two states: 1 loops on itself under `None`, `Jump` crashes into 0,
    /// and 0 is absorbing.
    fn loop_or_crash() -> MdpModel {
        let mut model = MdpModel::new(2).unwrap();
        model.record(idx(1), Action::None, idx(1), ALIVE_REWARD).unwrap();
        model.record(idx(1), Action::Jump, idx(0), CRASH_REWARD).unwrap();
        for action in Action::ALL {
            model.record(idx(0), action, idx(0), CRASH_REWARD).unwrap();
        }
        model.estimate();
        model
    }

    #[test]
    fn test_converges_to_geometric_series() {
        let mut model = loop_or_crash();
        let solver = ValueIteration::new(0.5, 1e-10);
        let report = solver.solve(&mut model);

        assert!(report.converged);
        // V(1) = 1 / (1 - 0.5), V(0) = -1000 / (1 - 0.5)
        assert!((model.value(idx(1)) - 2.0).abs() < 1e-8);
        assert!((model.value(idx(0)) + 2000.0).abs() < 1e-6);
    }

    #[test]
    fn test_sweep_is_synchronous() {
        let model = loop_or_crash();
        let solver = ValueIteration::new(0.5, 1e-10);
        let current = vec![10.0, 4.0];
        let mut next = vec![0.0; 2];

        let residual = solver.sweep(&model, &current, &mut next);
        // state 1 uses the old V(1) = 4 (None) and old V(0) = 10 (Jump)
        assert_eq!(next[1], 1.0 + 0.5 * 10.0);
        assert_eq!(next[0], -1000.0 + 0.5 * 10.0);
        assert_eq!(residual, 1005.0);
    }

    #[test]
    fn test_duck_excluded_from_default_backup() {
        let mut model = MdpModel::new(3).unwrap();
        // Only ducking in state 1 leads to the rewarding state 2.
        model.record(idx(1), Action::None, idx(0), CRASH_REWARD).unwrap();
        model.record(idx(1), Action::Jump, idx(0), CRASH_REWARD).unwrap();
        model.record(idx(1), Action::Duck, idx(2), 10.0).unwrap();
        for action in Action::ALL {
            model.record(idx(0), action, idx(0), CRASH_REWARD).unwrap();
            model.record(idx(2), action, idx(2), 10.0).unwrap();
        }
        model.estimate();

        let mut faithful = model.clone();
        ValueIteration::new(0.9, 1e-9).solve(&mut faithful);
        let mut corrected = model;
        ValueIteration::new(0.9, 1e-9)
            .with_backup(BackupActions::All)
            .solve(&mut corrected);

        assert!(faithful.value(idx(1)) < 0.0);
        assert!(corrected.value(idx(1)) > 0.0);
    }

    #[test]
    fn test_sweep_cap_reports_non_convergence() {
        let mut model = loop_or_crash();
        let solver = ValueIteration::new(1.0, 1e-6).with_max_sweeps(25);
        let report = solver.solve(&mut model);

        assert!(!report.converged);
        assert_eq!(report.sweeps, 25);
        assert!(matches!(
            report.into_result(),
            Err(Error::ValueIterationDidNotConverge { sweeps: 25, .. })
        ));
    }

    #[test]
    fn test_backup_action_sets() {
        assert_eq!(BackupActions::default().actions(), &[Action::None, Action::Jump]);
        assert_eq!(BackupActions::All.actions().len(), 3);
    }
}
