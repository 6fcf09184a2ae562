//! Shared argument groups for CLI commands

use clap::{Args, ValueEnum};

use crate::{app::AgentConfig, env::RunnerConfig, mdp::BackupActions};

/// Actions maximized over during planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackupArg {
    /// Plan over doing nothing and jumping only
    NoneAndJump,
    /// Plan over every action, ducking included
    All,
}

impl From<BackupArg> for BackupActions {
    fn from(arg: BackupArg) -> Self {
        match arg {
            BackupArg::NoneAndJump => BackupActions::NoneAndJump,
            BackupArg::All => BackupActions::All,
        }
    }
}

/// Agent construction options
#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// Discount factor (0.0-1.0, exclusive)
    #[arg(long, default_value_t = 0.95)]
    pub gamma: f64,

    /// Value iteration convergence tolerance
    #[arg(long, default_value_t = 0.01)]
    pub tolerance: f64,

    /// Number of distance buckets
    #[arg(long, default_value_t = 20)]
    pub distance_buckets: usize,

    /// Largest distance covered by the distance grid
    #[arg(long, default_value_t = 600.0)]
    pub max_distance: f64,

    /// Initial probability of acting greedily
    #[arg(long, default_value_t = 1.0)]
    pub initial_epsilon: f64,

    /// Added to epsilon after every episode
    #[arg(long, default_value_t = 0.01)]
    pub epsilon_step: f64,

    /// Chance that an exploratory step jumps
    #[arg(long, default_value_t = 0.01)]
    pub explore_jump: f64,

    /// Sweep cap for value iteration
    #[arg(long, default_value_t = 10_000)]
    pub max_sweeps: usize,

    /// Actions considered by the Bellman backup
    #[arg(long, value_enum, default_value = "none-and-jump")]
    pub backup: BackupArg,
}

impl AgentArgs {
    pub fn to_config(&self, seed: Option<u64>) -> AgentConfig {
        let mut config = AgentConfig::new()
            .with_gamma(self.gamma)
            .with_tolerance(self.tolerance)
            .with_distance_buckets(self.distance_buckets, self.max_distance)
            .with_initial_epsilon(self.initial_epsilon)
            .with_epsilon_step(self.epsilon_step)
            .with_explore_jump_probability(self.explore_jump)
            .with_max_sweeps(self.max_sweeps)
            .with_backup(self.backup.into());
        config.seed = seed;
        config
    }
}

/// Simulated runner options
#[derive(Args, Debug, Clone)]
pub struct RunnerArgs {
    /// Distance obstacles scroll per frame
    #[arg(long, default_value_t = 10.0)]
    pub speed: f64,

    /// Smallest distance between obstacles
    #[arg(long, default_value_t = 250.0)]
    pub min_gap: f64,

    /// Largest distance between obstacles
    #[arg(long, default_value_t = 600.0)]
    pub max_gap: f64,

    /// Frames a jump stays airborne
    #[arg(long, default_value_t = 10)]
    pub jump_frames: u32,

    /// Chance that an obstacle is a pterodactyl (0.0-1.0)
    #[arg(long, default_value_t = 0.2)]
    pub pterodactyls: f64,

    /// Seed for the obstacle sequence (defaults to the run seed)
    #[arg(long)]
    pub course_seed: Option<u64>,
}

impl RunnerArgs {
    pub fn to_config(&self, fallback_seed: Option<u64>) -> RunnerConfig {
        let mut config = RunnerConfig::new()
            .with_speed(self.speed)
            .with_gaps(self.min_gap, self.max_gap)
            .with_jump_frames(self.jump_frames)
            .with_pterodactyl_probability(self.pterodactyls);
        config.seed = self.course_seed.or(fallback_seed);
        config
    }
}
