//! Subcommands of the `dino` binary

pub mod evaluate;
pub mod inspect;
pub mod train;
