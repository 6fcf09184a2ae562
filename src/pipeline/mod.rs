//! Training and evaluation pipeline
//!
//! This module provides:
//! - A pipeline driving an [`MdpAgent`](crate::agent::MdpAgent) against an
//!   [`Environment`](crate::ports::Environment) for a number of episodes
//! - Frozen greedy evaluation of a trained agent
//! - Observers recording what happens during a run

pub mod observers;
pub mod training;

pub use observers::{
    CsvObserver, EpisodeRecord, JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver,
    TracingObserver,
};
pub use training::{RunMode, TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::Observer;
