//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Result, agent::EpisodeSummary, ports::Observer};

/// Flat, one-row view of a finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub steps: usize,
    pub crashed: bool,
    pub epsilon: f64,
    /// Rows re-normalized by the refit (empty when frozen)
    pub rows_updated: Option<usize>,
    pub sweeps: Option<usize>,
    pub residual: Option<f64>,
    pub converged: Option<bool>,
}

impl From<&EpisodeSummary> for EpisodeRecord {
    fn from(summary: &EpisodeSummary) -> Self {
        Self {
            episode: summary.episode,
            steps: summary.steps,
            crashed: summary.crashed,
            epsilon: summary.epsilon,
            rows_updated: summary.refit.map(|r| r.estimate.rows_updated),
            sweeps: summary.refit.map(|r| r.solve.sweeps),
            residual: summary.refit.map(|r| r.solve.residual),
            converged: summary.refit.map(|r| r.solve.converged),
        }
    }
}

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    completed: u64,
    best: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            completed: 0,
            best: 0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes (best: {msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        self.completed = 0;
        self.best = 0;
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.completed += 1;
        self.best = self.best.max(summary.steps);

        if let Some(pb) = &self.progress_bar {
            pb.set_position(self.completed);
            pb.set_message(self.best.to_string());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.best.to_string());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
pub struct MetricsObserver {
    scores: Vec<usize>,
    crashes: usize,
    unconverged_refits: usize,
    window: usize,
}

impl MetricsObserver {
    /// Default size of the moving-average window
    pub const DEFAULT_WINDOW: usize = 50;

    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_WINDOW)
    }

    /// Observer whose recent mean covers the last `window` episodes.
    pub fn with_window(window: usize) -> Self {
        Self {
            scores: Vec::new(),
            crashes: 0,
            unconverged_refits: 0,
            window: window.max(1),
        }
    }

    /// Episode lengths in order.
    pub fn scores(&self) -> &[usize] {
        &self.scores
    }

    pub fn best_score(&self) -> usize {
        self.scores.iter().copied().max().unwrap_or(0)
    }

    pub fn mean_score(&self) -> f64 {
        mean(&self.scores)
    }

    /// Mean episode length over the trailing window.
    pub fn recent_mean(&self) -> f64 {
        let start = self.scores.len().saturating_sub(self.window);
        mean(&self.scores[start..])
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            episodes: self.scores.len(),
            best_score: self.best_score(),
            mean_score: self.mean_score(),
            recent_mean: self.recent_mean(),
            crashes: self.crashes,
            unconverged_refits: self.unconverged_refits,
        }
    }
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub best_score: usize,
    pub mean_score: f64,
    pub recent_mean: f64,
    pub crashes: usize,
    pub unconverged_refits: usize,
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.scores.push(summary.steps);
        if summary.crashed {
            self.crashes += 1;
        }
        if summary.refit.is_some_and(|r| !r.solve.converged) {
            self.unconverged_refits += 1;
        }
        Ok(())
    }
}

/// JSONL observer - Exports one [`EpisodeRecord`] per line
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &EpisodeRecord::from(summary))?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV observer - Exports one [`EpisodeRecord`] per row
pub struct CsvObserver {
    writer: csv::Writer<File>,
}

impl CsvObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl Observer for CsvObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.writer.serialize(EpisodeRecord::from(summary))?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Logs every `every`-th episode at INFO level.
pub struct TracingObserver {
    every: usize,
}

impl TracingObserver {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Observer for TracingObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        info!(total_episodes, "run started");
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        if (summary.episode + 1).is_multiple_of(self.every) {
            info!(
                episode = summary.episode,
                steps = summary.steps,
                crashed = summary.crashed,
                epsilon = summary.epsilon,
                sweeps = ?summary.refit.map(|r| r.solve.sweeps),
                "episode finished"
            );
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        info!("run finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::{EstimateStats, RefitReport, SolveReport};

    fn summary(episode: usize, steps: usize, converged: bool) -> EpisodeSummary {
        EpisodeSummary {
            episode,
            steps,
            crashed: true,
            epsilon: 1.0,
            refit: Some(RefitReport {
                estimate: EstimateStats {
                    rows_updated: 4,
                    rewards_updated: 2,
                },
                solve: SolveReport {
                    converged,
                    sweeps: 12,
                    residual: 0.001,
                    tolerance: 0.01,
                },
            }),
        }
    }

    #[test]
    fn test_metrics_observer() {
        let mut observer = MetricsObserver::with_window(2);
        assert_eq!(observer.mean_score(), 0.0);

        observer.on_episode_end(&summary(0, 10, true)).unwrap();
        observer.on_episode_end(&summary(1, 40, false)).unwrap();
        observer.on_episode_end(&summary(2, 20, true)).unwrap();

        let metrics = observer.summary();
        assert_eq!(metrics.episodes, 3);
        assert_eq!(metrics.best_score, 40);
        assert!((metrics.mean_score - 70.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.recent_mean, 30.0);
        assert_eq!(metrics.crashes, 3);
        assert_eq!(metrics.unconverged_refits, 1);
    }

    #[test]
    fn test_episode_record_flattens_refit() {
        let record = EpisodeRecord::from(&summary(5, 33, true));
        assert_eq!(record.episode, 5);
        assert_eq!(record.rows_updated, Some(4));
        assert_eq!(record.sweeps, Some(12));
        assert_eq!(record.converged, Some(true));

        let frozen = EpisodeSummary {
            refit: None,
            ..summary(6, 1, true)
        };
        assert_eq!(EpisodeRecord::from(&frozen).sweeps, None);
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_episode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episodes.jsonl");

        let mut observer = JsonlObserver::new(&path).unwrap();
        observer.on_episode_end(&summary(0, 3, true)).unwrap();
        observer.on_episode_end(&summary(1, 7, true)).unwrap();
        drop(observer);

        let contents = std::fs::read_to_string(&path).unwrap();
        let records: Vec<EpisodeRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].steps, 7);
    }

    #[test]
    fn test_csv_observer_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episodes.csv");

        let mut observer = CsvObserver::new(&path).unwrap();
        observer.on_episode_end(&summary(0, 3, true)).unwrap();
        observer.on_training_end().unwrap();
        drop(observer);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "episode");
        let rows: Vec<EpisodeRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![EpisodeRecord::from(&summary(0, 3, true))]);
    }
}
