//! Frame-stepped obstacle course
//!
//! A minimal stand-in for the browser runner game. Obstacles spawn at a fixed
//! distance ahead and scroll towards the runner at a constant speed. The
//! runner sits at `x = 0`; an obstacle is being passed while its span
//! `[dx, dx + width)` covers that point.
//!
//! Clearing rules while passing an obstacle:
//!
//! | obstacle            | clears when          |
//! |---------------------|----------------------|
//! | cactus (any size)   | airborne             |
//! | pterodactyl at 50   | airborne             |
//! | pterodactyl at 75   | airborne or ducking  |
//! | pterodactyl at 100  | ducking              |
//!
//! A jump keeps the runner airborne for a fixed number of frames and cannot be
//! re-triggered mid-air. Ducking lasts a single frame.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    discretizer::{MAX_CONSECUTIVE_OBS, PTERODACTYL_HEIGHTS},
    ports::Environment,
    types::{ObstacleType, Observation},
};

const SMALL_CACTUS_WIDTH: f64 = 17.0;
const LARGE_CACTUS_WIDTH: f64 = 25.0;
const PTERODACTYL_WIDTH: f64 = 46.0;

/// Parameters of the simulated course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Distance obstacles scroll per frame
    pub speed: f64,
    /// Distance ahead at which obstacles appear
    pub spawn_distance: f64,
    /// Smallest distance between consecutive spawns
    pub min_gap: f64,
    /// Largest distance between consecutive spawns
    pub max_gap: f64,
    /// Frames a jump stays airborne
    pub jump_frames: u32,
    /// Chance that a spawned obstacle is a pterodactyl
    pub pterodactyl_probability: f64,
    /// Random seed for the obstacle sequence
    pub seed: Option<u64>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self {
            speed: 10.0,
            spawn_distance: 600.0,
            min_gap: 250.0,
            max_gap: 600.0,
            jump_frames: 10,
            pterodactyl_probability: 0.2,
            seed: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_gaps(mut self, min_gap: f64, max_gap: f64) -> Self {
        self.min_gap = min_gap;
        self.max_gap = max_gap;
        self
    }

    pub fn with_jump_frames(mut self, frames: u32) -> Self {
        self.jump_frames = frames;
        self
    }

    pub fn with_pterodactyl_probability(mut self, probability: f64) -> Self {
        self.pterodactyl_probability = probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        if !(self.speed.is_finite() && self.speed > 0.0) {
            return invalid(format!("runner speed must be positive, got {}", self.speed));
        }
        if !(self.spawn_distance.is_finite() && self.spawn_distance > 0.0) {
            return invalid(format!(
                "spawn distance must be positive, got {}",
                self.spawn_distance
            ));
        }
        if !(self.min_gap.is_finite() && self.min_gap > 0.0 && self.min_gap <= self.max_gap) {
            return invalid(format!(
                "obstacle gaps must satisfy 0 < min <= max, got {}..{}",
                self.min_gap, self.max_gap
            ));
        }
        if !self.max_gap.is_finite() {
            return invalid(format!("max gap must be finite, got {}", self.max_gap));
        }
        if self.jump_frames == 0 {
            return invalid("jump must last at least one frame".to_string());
        }
        if !(0.0..=1.0).contains(&self.pterodactyl_probability) {
            return invalid(format!(
                "pterodactyl probability must be in [0, 1], got {}",
                self.pterodactyl_probability
            ));
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Obstacle {
    kind: ObstacleType,
    config: f64,
    dx: f64,
}

impl Obstacle {
    fn width(&self) -> f64 {
        match self.kind {
            ObstacleType::SmallCactus => SMALL_CACTUS_WIDTH * self.config,
            ObstacleType::LargeCactus => LARGE_CACTUS_WIDTH * self.config,
            ObstacleType::Pterodactyl => PTERODACTYL_WIDTH,
        }
    }

    fn is_behind(&self) -> bool {
        self.dx + self.width() <= 0.0
    }

    fn overlaps_runner(&self) -> bool {
        self.dx <= 0.0 && !self.is_behind()
    }

    fn cleared(&self, airborne: bool, ducking: bool) -> bool {
        match self.kind {
            ObstacleType::SmallCactus | ObstacleType::LargeCactus => airborne,
            ObstacleType::Pterodactyl => {
                if self.config <= PTERODACTYL_HEIGHTS[0] {
                    airborne
                } else if self.config <= PTERODACTYL_HEIGHTS[1] {
                    airborne || ducking
                } else {
                    ducking
                }
            }
        }
    }

    fn observe(&self) -> Observation {
        Observation::new(self.kind, self.config, self.dx.max(0.0))
    }
}

/// Seeded side-scrolling runner.
///
/// # Examples
///
/// ```
/// use dino_mdp::env::{RunnerConfig, SimulatedRunner};
/// use dino_mdp::ports::Environment;
///
/// let mut runner = SimulatedRunner::new(RunnerConfig::new().with_seed(7))?;
/// runner.start();
/// while !runner.is_crashed() {
///     runner.advance();
/// }
/// assert!(runner.frame() > 0);
/// # Ok::<(), dino_mdp::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedRunner {
    config: RunnerConfig,
    rng: StdRng,
    obstacles: Vec<Obstacle>,
    until_spawn: f64,
    airborne_frames: u32,
    ducking: bool,
    crashed: bool,
    frame: usize,
}

impl SimulatedRunner {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the configuration does not
    /// validate.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut runner = Self {
            config,
            rng,
            obstacles: Vec::new(),
            until_spawn: 0.0,
            airborne_frames: 0,
            ducking: false,
            crashed: false,
            frame: 0,
        };
        runner.reset();
        Ok(runner)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Frames survived in the current episode.
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne_frames > 0
    }

    /// Obstacles currently on the course.
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    fn reset(&mut self) {
        self.obstacles.clear();
        self.until_spawn = self.sample_gap();
        self.airborne_frames = 0;
        self.ducking = false;
        self.crashed = false;
        self.frame = 0;
    }

    fn sample_gap(&mut self) -> f64 {
        if self.config.min_gap < self.config.max_gap {
            self.rng.random_range(self.config.min_gap..=self.config.max_gap)
        } else {
            self.config.min_gap
        }
    }

    fn spawn(&mut self) {
        let obstacle = if self.rng.random_bool(self.config.pterodactyl_probability) {
            let height = PTERODACTYL_HEIGHTS[self.rng.random_range(0..PTERODACTYL_HEIGHTS.len())];
            Obstacle {
                kind: ObstacleType::Pterodactyl,
                config: height,
                dx: self.config.spawn_distance,
            }
        } else {
            let kind = if self.rng.random_bool(0.5) {
                ObstacleType::SmallCactus
            } else {
                ObstacleType::LargeCactus
            };
            Obstacle {
                kind,
                config: self.rng.random_range(1..=MAX_CONSECUTIVE_OBS) as f64,
                dx: self.config.spawn_distance,
            }
        };
        self.obstacles.push(obstacle);
    }
}

impl Environment for SimulatedRunner {
    fn get_state(&self) -> Option<Observation> {
        self.obstacles
            .iter()
            .filter(|o| !o.is_behind())
            .min_by(|a, b| a.dx.total_cmp(&b.dx))
            .map(Obstacle::observe)
    }

    fn is_crashed(&self) -> bool {
        self.crashed
    }

    fn start(&mut self) {
        self.reset();
    }

    fn jump(&mut self) {
        if !self.crashed && self.airborne_frames == 0 {
            self.airborne_frames = self.config.jump_frames;
        }
    }

    fn duck(&mut self) {
        if !self.crashed && self.airborne_frames == 0 {
            self.ducking = true;
        }
    }

    fn advance(&mut self) {
        if self.crashed {
            return;
        }

        let speed = self.config.speed;
        for obstacle in &mut self.obstacles {
            obstacle.dx -= speed;
        }

        let airborne = self.airborne_frames > 0;
        let ducking = self.ducking;
        self.crashed = self
            .obstacles
            .iter()
            .any(|o| o.overlaps_runner() && !o.cleared(airborne, ducking));

        self.obstacles.retain(|o| !o.is_behind());
        self.airborne_frames = self.airborne_frames.saturating_sub(1);
        self.ducking = false;
        self.frame += 1;

        self.until_spawn -= speed;
        if self.until_spawn <= 0.0 {
            self.spawn();
            self.until_spawn = self.sample_gap();
        }
    }
}
