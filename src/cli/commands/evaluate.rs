//! Evaluate command - Greedy play with a frozen model

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::App,
    cli::{
        config::RunnerArgs,
        output::{print_kv, print_result, print_section},
    },
    pipeline::{ProgressObserver, TrainingConfig, TrainingPipeline},
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a trained agent")]
pub struct EvaluateArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 20)]
    pub episodes: usize,

    /// Step cap per episode (0 = unlimited)
    #[arg(long, default_value_t = 10_000)]
    pub max_steps: usize,

    /// Random seed for the obstacle course
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Export results to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let app = App::new();

    println!("Loading trained agent from: {}", args.agent.display());
    let saved = app
        .load_snapshot(&args.agent)
        .with_context(|| format!("failed to load agent from {}", args.agent.display()))?;
    let mut agent = saved.to_agent()?;

    print_section("Loaded Agent");
    print_kv("States", &agent.model().num_states().to_string());
    print_kv("Episodes trained", &saved.episodes().to_string());
    if let Some(best) = saved.metadata.best_score {
        print_kv("Best training score", &best.to_string());
    }

    let mut env = app
        .create_runner(args.runner.to_config(args.seed))
        .context("invalid runner configuration")?;

    let mut config = TrainingConfig::new(args.episodes);
    config.max_steps_per_episode = (args.max_steps > 0).then_some(args.max_steps);

    let mut pipeline = TrainingPipeline::new(config);
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }

    let result = pipeline.evaluate(&mut agent, &mut env)?;

    print_section("Evaluation Results");
    print_result(&result);

    if let Some(path) = &args.export {
        result
            .save(path)
            .with_context(|| format!("failed to export results to {}", path.display()))?;
        println!("\n✓ Results exported to: {}", path.display());
    }

    Ok(())
}
