//! dino - Model-based reinforcement learning for a side-scrolling runner
//!
//! This CLI provides a unified interface for:
//! - Training an agent against the simulated runner
//! - Evaluating a trained agent with a frozen model
//! - Inspecting the learned model

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dino")]
#[command(version, about = "Model-based runner agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent on the simulated runner
    Train(Box<dino_mdp::cli::commands::train::TrainArgs>),

    /// Evaluate a trained agent with greedy play
    Evaluate(dino_mdp::cli::commands::evaluate::EvaluateArgs),

    /// Print what a saved agent has learned
    Inspect(dino_mdp::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => dino_mdp::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => dino_mdp::cli::commands::evaluate::execute(args),
        Commands::Inspect(args) => dino_mdp::cli::commands::inspect::execute(args),
    }
}
