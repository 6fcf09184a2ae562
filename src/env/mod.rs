//! In-process game environments.

pub mod runner;

pub use runner::{RunnerConfig, SimulatedRunner};
