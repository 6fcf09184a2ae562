//! Environment port - the game the agent plays
//!
//! The runner game is an external collaborator. The agent reads the nearest
//! obstacle and the crash flag from it and sends it jump/duck commands;
//! nothing else couples the two.

use crate::types::{Action, Observation};

/// Side-scrolling runner as seen by the agent.
///
/// # Examples
///
/// ```
/// use dino_mdp::{ports::Environment, types::Observation};
///
/// struct EmptyRoad {
///     crashed: bool,
/// }
///
/// impl Environment for EmptyRoad {
///     fn get_state(&self) -> Option<Observation> {
///         None
///     }
///     fn is_crashed(&self) -> bool {
///         self.crashed
///     }
///     fn start(&mut self) {
///         self.crashed = false;
///     }
///     fn jump(&mut self) {}
///     fn duck(&mut self) {}
/// }
/// ```
pub trait Environment {
    /// Nearest obstacle ahead, or `None` if the road is clear.
    fn get_state(&self) -> Option<Observation>;

    /// Whether the runner has hit an obstacle.
    fn is_crashed(&self) -> bool;

    /// Reset the game for a new episode.
    fn start(&mut self);

    fn jump(&mut self);

    fn duck(&mut self);

    /// Advance the game by one frame.
    ///
    /// Games that run on their own clock (a browser tab, for instance) keep
    /// the default no-op; in-process simulations step here so the training
    /// pipeline can drive them in lock-step with the agent.
    fn advance(&mut self) {}

    /// Issue `action`. Doing nothing sends no command.
    fn perform(&mut self, action: Action) {
        match action {
            Action::Jump => self.jump(),
            Action::Duck => self.duck(),
            Action::None => {}
        }
    }
}
