//! Ports (trait boundaries) for external dependencies.
//!
//! The agent core only talks to the game, to training observers and to model
//! storage through these traits. Concrete implementations live in
//! [`crate::adapters`], [`crate::env`] and [`crate::pipeline`].

pub mod environment;
pub mod observer;
pub mod repository;

pub use environment::Environment;
pub use observer::Observer;
pub use repository::AgentRepository;
