//! State discretization
//!
//! Maps the nearest-obstacle observation onto a finite set of state indices.
//! Each continuous dimension is snapped to the closest point of a fixed grid:
//!
//! - cactus group size: `1..=MAX_CONSECUTIVE_OBS`
//! - pterodactyl height: [`PTERODACTYL_HEIGHTS`]
//! - horizontal distance: `n_x` evenly spaced points over `[0, max_dx]`
//!
//! Values outside a grid saturate to its boundary bucket.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    types::{ObstacleType, Observation, StateIndex},
};

/// Largest cactus group the game spawns.
pub const MAX_CONSECUTIVE_OBS: usize = 3;

/// Heights at which pterodactyls fly.
pub const PTERODACTYL_HEIGHTS: [f64; 3] = [50.0, 75.0, 100.0];

/// Decoded meaning of a state index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StateCell {
    Fail,
    NoObstacle,
    Obstacle {
        obstacle: ObstacleType,
        /// Grid value of the configuration bucket
        config: f64,
        /// Grid value of the distance bucket
        dx: f64,
    },
}

/// Nearest-grid-point discretizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDiscretizer {
    distance_grid: Vec<f64>,
    cactus_grid: Vec<f64>,
    pterodactyl_grid: Vec<f64>,
    config_buckets: usize,
}

impl StateDiscretizer {
    /// Create a discretizer with `n_x` distance buckets spanning `[0, max_dx]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `n_x` is zero or `max_dx` is
    /// not a positive finite number.
    pub fn new(n_x: usize, max_dx: f64) -> Result<Self> {
        if n_x == 0 {
            return Err(Error::InvalidConfiguration {
                message: "n_x must be at least 1".to_string(),
            });
        }
        if !(max_dx.is_finite() && max_dx > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("max_dx must be positive and finite, got {max_dx}"),
            });
        }

        let cactus_grid: Vec<f64> = (1..=MAX_CONSECUTIVE_OBS).map(|n| n as f64).collect();
        let pterodactyl_grid = PTERODACTYL_HEIGHTS.to_vec();
        let config_buckets = cactus_grid.len().max(pterodactyl_grid.len());

        Ok(Self {
            distance_grid: linspace(0.0, max_dx, n_x),
            cactus_grid,
            pterodactyl_grid,
            config_buckets,
        })
    }

    /// Number of distance buckets.
    pub fn distance_buckets(&self) -> usize {
        self.distance_grid.len()
    }

    /// Number of configuration buckets per obstacle type.
    pub fn config_buckets(&self) -> usize {
        self.config_buckets
    }

    /// Total number of discrete states, including the two reserved ones.
    pub fn num_states(&self) -> usize {
        ObstacleType::COUNT * self.config_buckets * self.distance_buckets() + StateIndex::RESERVED
    }

    /// Distance grid points.
    pub fn distance_grid(&self) -> &[f64] {
        &self.distance_grid
    }

    fn config_grid(&self, obstacle: ObstacleType) -> &[f64] {
        match obstacle {
            ObstacleType::Pterodactyl => &self.pterodactyl_grid,
            ObstacleType::SmallCactus | ObstacleType::LargeCactus => &self.cactus_grid,
        }
    }

    /// Map an observation to its state index.
    ///
    /// A terminal flag always yields [`StateIndex::FAIL`], and a missing
    /// observation yields [`StateIndex::NO_OBSTACLE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteObservation`] when the configuration value or
    /// distance is NaN or infinite.
    pub fn discretize(&self, observation: Option<&Observation>, terminal: bool) -> Result<StateIndex> {
        if terminal {
            return Ok(StateIndex::FAIL);
        }
        let Some(obs) = observation else {
            return Ok(StateIndex::NO_OBSTACLE);
        };

        if !obs.config.is_finite() {
            return Err(Error::NonFiniteObservation {
                field: "config",
                value: obs.config,
            });
        }
        if !obs.dx.is_finite() {
            return Err(Error::NonFiniteObservation {
                field: "dx",
                value: obs.dx,
            });
        }

        let j = nearest_index(self.config_grid(obs.obstacle), obs.config);
        let k = nearest_index(&self.distance_grid, obs.dx);
        Ok(self.linearize(obs.obstacle, j, k))
    }

    fn linearize(&self, obstacle: ObstacleType, config_bucket: usize, distance_bucket: usize) -> StateIndex {
        let n_x = self.distance_buckets();
        StateIndex::new(
            obstacle.ordinal() * self.config_buckets * n_x
                + config_bucket * n_x
                + distance_bucket
                + StateIndex::RESERVED,
        )
    }

    /// Recover the grid cell a state index stands for.
    ///
    /// Returns `None` for indices outside the state space and for padding
    /// cells whose configuration bucket does not exist for that obstacle.
    pub fn decode(&self, index: StateIndex) -> Option<StateCell> {
        match index {
            StateIndex::FAIL => return Some(StateCell::Fail),
            StateIndex::NO_OBSTACLE => return Some(StateCell::NoObstacle),
            _ => {}
        }
        if index.value() >= self.num_states() {
            return None;
        }

        let n_x = self.distance_buckets();
        let offset = index.value() - StateIndex::RESERVED;
        let obstacle = ObstacleType::ALL[offset / (self.config_buckets * n_x)];
        let config_bucket = (offset / n_x) % self.config_buckets;
        let distance_bucket = offset % n_x;

        let config = *self.config_grid(obstacle).get(config_bucket)?;
        Some(StateCell::Obstacle {
            obstacle,
            config,
            dx: self.distance_grid[distance_bucket],
        })
    }
}

/// `n` evenly spaced points from `start` to `stop` inclusive.
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let span = stop - start;
    (0..n)
        .map(|i| start + span * i as f64 / (n - 1) as f64)
        .collect()
}

/// Index of the grid point closest to `x`; ties go to the lower index.
///
/// `grid` must be sorted ascending and non-empty.
fn nearest_index(grid: &[f64], x: f64) -> usize {
    debug_assert!(!grid.is_empty());
    let upper = grid.partition_point(|&g| g < x);
    if upper == 0 {
        return 0;
    }
    if upper == grid.len() {
        return grid.len() - 1;
    }
    let below = x - grid[upper - 1];
    let above = grid[upper] - x;
    if above < below { upper } else { upper - 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discretizer() -> StateDiscretizer {
        StateDiscretizer::new(5, 400.0).unwrap()
    }

    #[test]
    fn test_linspace_endpoints() {
        let grid = linspace(0.0, 400.0, 5);
        assert_eq!(grid, vec![0.0, 100.0, 200.0, 300.0, 400.0]);
        assert_eq!(linspace(0.0, 10.0, 1), vec![0.0]);
    }

    #[test]
    fn test_nearest_index_ties_pick_lower() {
        let grid = [0.0, 100.0, 200.0];
        assert_eq!(nearest_index(&grid, 50.0), 0);
        assert_eq!(nearest_index(&grid, 150.0), 1);
        assert_eq!(nearest_index(&grid, 151.0), 2);
        assert_eq!(nearest_index(&grid, 100.0), 1);
    }

    #[test]
    fn test_nearest_index_saturates() {
        let grid = [1.0, 2.0, 3.0];
        assert_eq!(nearest_index(&grid, -40.0), 0);
        assert_eq!(nearest_index(&grid, 99.0), 2);
    }

    #[test]
    fn test_num_states() {
        assert_eq!(discretizer().num_states(), 3 * 3 * 5 + 2);
    }

    #[test]
    fn test_linearization() {
        let d = discretizer();
        let obs = Observation::new(ObstacleType::LargeCactus, 2.0, 310.0);
        // 1 * 3 * 5 + 1 * 5 + 3 + 2
        assert_eq!(d.discretize(Some(&obs), false).unwrap(), StateIndex::new(25));
    }

    #[test]
    fn test_pterodactyl_uses_height_grid() {
        let d = discretizer();
        let obs = Observation::new(ObstacleType::Pterodactyl, 80.0, 0.0);
        // 2 * 3 * 5 + 1 * 5 + 0 + 2
        assert_eq!(d.discretize(Some(&obs), false).unwrap(), StateIndex::new(37));
    }

    #[test]
    fn test_non_finite_rejected() {
        let d = discretizer();
        let obs = Observation::new(ObstacleType::SmallCactus, 1.0, f64::NAN);
        assert!(matches!(
            d.discretize(Some(&obs), false),
            Err(Error::NonFiniteObservation { field: "dx", .. })
        ));
    }

    #[test]
    fn test_decode_inverts_discretize() {
        let d = discretizer();
        let obs = Observation::new(ObstacleType::Pterodactyl, 100.0, 200.0);
        let index = d.discretize(Some(&obs), false).unwrap();
        assert_eq!(
            d.decode(index),
            Some(StateCell::Obstacle {
                obstacle: ObstacleType::Pterodactyl,
                config: 100.0,
                dx: 200.0,
            })
        );
        assert_eq!(d.decode(StateIndex::FAIL), Some(StateCell::Fail));
        assert_eq!(d.decode(StateIndex::new(d.num_states())), None);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(StateDiscretizer::new(0, 100.0).is_err());
        assert!(StateDiscretizer::new(3, 0.0).is_err());
        assert!(StateDiscretizer::new(3, f64::INFINITY).is_err());
    }
}
