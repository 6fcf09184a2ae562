//! Approximate MDP estimated from observed play
//!
//! The model keeps running transition and reward counts for the whole life of
//! the agent. At every episode boundary the counts are turned into maximum
//! likelihood estimates and the value function is recomputed by synchronous
//! value iteration.
//!
//! ```
//! use dino_mdp::mdp::{MdpModel, ValueIteration};
//! use dino_mdp::types::{Action, StateIndex};
//!
//! let mut model = MdpModel::new(3)?;
//! model.record(StateIndex::new(1), Action::Jump, StateIndex::new(2), 1.0)?;
//!
//! let solver = ValueIteration::new(0.9, 1e-6);
//! let report = model.refit(&solver);
//! assert!(report.solve.converged);
//! assert_eq!(model.transition_probs(StateIndex::new(1), Action::Jump), &[0.0, 0.0, 1.0]);
//! # Ok::<(), dino_mdp::Error>(())
//! ```

pub mod model;
pub mod tensor;
pub mod value_iteration;

pub use model::{ALIVE_REWARD, CRASH_REWARD, EstimateStats, MdpModel, RefitReport, step_reward};
pub use tensor::TransitionTensor;
pub use value_iteration::{BackupActions, SolveReport, ValueIteration};
