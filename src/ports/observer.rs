//! Observer port - abstraction for training observation and data collection
//!
//! Observers receive training events without the pipeline knowing about
//! progress bars, log files or metrics.

use crate::{
    Result,
    agent::{EpisodeSummary, StepOutcome},
};

/// Observer trait for monitoring training and evaluation runs.
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - Once at the beginning
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(...)` - After every recorded environment step
///    - `on_episode_end(summary)` - After the episode-boundary refit
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use dino_mdp::{agent::EpisodeSummary, ports::Observer};
///
/// struct LongestRun {
///     best: usize,
/// }
///
/// impl Observer for LongestRun {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> dino_mdp::Result<()> {
///         self.best = self.best.max(summary.steps);
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when a run starts.
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called when an episode starts (0-based index).
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each environment step has been recorded.
    ///
    /// # Parameters
    ///
    /// * `episode` - Index of the current episode
    /// * `step` - Step number within the episode (0-based)
    /// * `outcome` - The recorded transition
    fn on_step(&mut self, _episode: usize, _step: usize, _outcome: &StepOutcome) -> Result<()> {
        Ok(())
    }

    /// Called when an episode ends, after the model was refit.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called when the run completes. Use this to flush files or print
    /// summaries.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
