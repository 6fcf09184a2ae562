//! Model-based reinforcement learning for a side-scrolling runner game
//!
//! This crate provides:
//! - Discretization of the nearest-obstacle observation into a finite state space
//! - An approximate MDP learned from transition counts and re-planned with
//!   value iteration at every episode boundary
//! - An epsilon-greedy agent that drives any [`ports::Environment`]
//! - A seeded simulated runner, a training/evaluation pipeline with observers,
//!   and MessagePack persistence of trained agents

pub mod adapters;
pub mod agent;
pub mod app;
pub mod cli;
pub mod discretizer;
pub mod env;
pub mod error;
pub mod mdp;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod serialization;
pub mod types;

pub use agent::{EpisodeSummary, MdpAgent, StepOutcome};
pub use discretizer::StateDiscretizer;
pub use error::{Error, Result};
pub use mdp::{MdpModel, ValueIteration};
pub use policy::EpsilonGreedy;
pub use types::{Action, ObstacleType, Observation, StateIndex};
