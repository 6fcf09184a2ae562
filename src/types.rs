//! Newtype wrappers and core domain types shared by every layer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Index of a discretized state.
///
/// Index 0 is the terminal (crashed) state and index 1 is the state where no
/// obstacle is on screen. Every other index encodes an obstacle type, a
/// configuration bucket and a distance bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateIndex(usize);

impl StateIndex {
    /// The terminal (crash) state.
    pub const FAIL: StateIndex = StateIndex(0);

    /// The state used when no obstacle is visible.
    pub const NO_OBSTACLE: StateIndex = StateIndex(1);

    /// Number of reserved indices preceding the obstacle states.
    pub const RESERVED: usize = 2;

    /// Create a state index without range validation.
    pub const fn new(value: usize) -> Self {
        StateIndex(value)
    }

    /// Get the inner value.
    pub fn value(&self) -> usize {
        self.0
    }

    /// Whether this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        *self == Self::FAIL
    }
}

impl From<StateIndex> for usize {
    fn from(index: StateIndex) -> Self {
        index.0
    }
}

impl fmt::Display for StateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Action issued to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Keep running.
    #[default]
    None = 0,
    /// Jump over the obstacle.
    Jump = 1,
    /// Duck under the obstacle.
    Duck = 2,
}

impl Action {
    /// Number of actions in the model.
    pub const COUNT: usize = 3;

    /// All actions in index order.
    pub const ALL: [Action; Action::COUNT] = [Action::None, Action::Jump, Action::Duck];

    /// Index of this action in the model tensors.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Action for a model index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::None => "none",
            Action::Jump => "jump",
            Action::Duck => "duck",
        };
        f.write_str(name)
    }
}

/// Obstacle kinds the runner can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleType {
    #[serde(rename = "CACTUS_SMALL")]
    SmallCactus,
    #[serde(rename = "CACTUS_LARGE")]
    LargeCactus,
    #[serde(rename = "PTERODACTYL")]
    Pterodactyl,
}

impl ObstacleType {
    /// Number of obstacle kinds.
    pub const COUNT: usize = 3;

    /// All obstacle kinds in ordinal order.
    pub const ALL: [ObstacleType; ObstacleType::COUNT] = [
        ObstacleType::SmallCactus,
        ObstacleType::LargeCactus,
        ObstacleType::Pterodactyl,
    ];

    /// Ordinal used in the state linearization.
    pub const fn ordinal(self) -> usize {
        match self {
            ObstacleType::SmallCactus => 0,
            ObstacleType::LargeCactus => 1,
            ObstacleType::Pterodactyl => 2,
        }
    }

    /// Wire name as reported by the game.
    pub const fn as_str(self) -> &'static str {
        match self {
            ObstacleType::SmallCactus => "CACTUS_SMALL",
            ObstacleType::LargeCactus => "CACTUS_LARGE",
            ObstacleType::Pterodactyl => "PTERODACTYL",
        }
    }
}

impl FromStr for ObstacleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CACTUS_SMALL" => Ok(ObstacleType::SmallCactus),
            "CACTUS_LARGE" => Ok(ObstacleType::LargeCactus),
            "PTERODACTYL" => Ok(ObstacleType::Pterodactyl),
            other => Err(Error::UnknownObstacleType {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ObstacleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of the nearest obstacle ahead of the runner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Obstacle kind
    #[serde(rename = "type")]
    pub obstacle: ObstacleType,
    /// Cactus group size (1..=3) or pterodactyl height
    pub config: f64,
    /// Horizontal distance between the runner and the obstacle
    pub dx: f64,
}

impl Observation {
    pub fn new(obstacle: ObstacleType, config: f64, dx: f64) -> Self {
        Self {
            obstacle,
            config,
            dx,
        }
    }

    /// Build an observation from the raw fields reported by a game bridge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownObstacleType`] for unrecognized type names.
    pub fn from_raw(kind: &str, config: f64, dx: f64) -> Result<Self> {
        Ok(Self::new(kind.parse()?, config, dx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_indices() {
        assert_eq!(Action::None.index(), 0);
        assert_eq!(Action::Jump.index(), 1);
        assert_eq!(Action::Duck.index(), 2);
        assert_eq!(Action::from_index(1), Some(Action::Jump));
        assert_eq!(Action::from_index(3), None);
    }

    #[test]
    fn test_obstacle_type_parse() {
        assert_eq!(
            "PTERODACTYL".parse::<ObstacleType>().unwrap(),
            ObstacleType::Pterodactyl
        );
        assert!(matches!(
            "BOULDER".parse::<ObstacleType>(),
            Err(Error::UnknownObstacleType { .. })
        ));
    }

    #[test]
    fn test_observation_json_uses_wire_names() {
        let obs = Observation::new(ObstacleType::LargeCactus, 2.0, 120.0);
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains("\"type\":\"CACTUS_LARGE\""));

        let err = serde_json::from_str::<Observation>(r#"{"type":"ROCK","config":1.0,"dx":3.0}"#);
        assert!(err.is_err());
    }
}
