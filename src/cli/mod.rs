//! CLI infrastructure for the dino runner agent
//!
//! This module provides the command-line interface for training, evaluating
//! and inspecting model-based runner agents.

pub mod commands;
pub mod config;
pub mod output;
