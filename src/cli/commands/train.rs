//! Train command - Train an agent on the simulated runner

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::App,
    cli::{
        config::{AgentArgs, RunnerArgs},
        output::{print_kv, print_result, print_section},
    },
    pipeline::{
        CsvObserver, JsonlObserver, ProgressObserver, TracingObserver, TrainingConfig,
        TrainingPipeline,
    },
    serialization::TrainingMetadata,
};

#[derive(Parser, Debug)]
#[command(about = "Train an agent", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 200)]
    pub episodes: usize,

    /// Step cap per episode (0 = unlimited)
    #[arg(long, default_value_t = 10_000)]
    pub max_steps: usize,

    /// Output file for the trained agent
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Continue training a saved agent instead of starting fresh
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Optional file for per-episode JSONL records
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional file for per-episode CSV records
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Log every N-th episode at INFO level
    #[arg(long)]
    pub log_every: Option<usize>,

    #[command(flatten)]
    pub agent: AgentArgs,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let app = App::new();

    let mut agent = match &args.resume {
        Some(path) => {
            println!("Resuming agent from: {}", path.display());
            app.load_agent(path)
                .with_context(|| format!("failed to load agent from {}", path.display()))?
        }
        None => app
            .create_agent(args.agent.to_config(args.seed))
            .context("invalid agent configuration")?,
    };
    let mut env = app
        .create_runner(args.runner.to_config(args.seed.map(|s| s.wrapping_add(1))))
        .context("invalid runner configuration")?;

    let mut config = TrainingConfig::new(args.episodes);
    config.max_steps_per_episode = (args.max_steps > 0).then_some(args.max_steps);
    config.seed = args.seed;

    print_section("Training Configuration");
    print_kv("Episodes", &args.episodes.to_string());
    print_kv("States", &agent.model().num_states().to_string());
    print_kv("Gamma", &agent.config().gamma.to_string());
    print_kv("Epsilon", &format!("{:.2}", agent.epsilon()));
    if let Some(seed) = args.seed {
        print_kv("Seed", &seed.to_string());
    }

    let mut pipeline = TrainingPipeline::new(config);
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(every) = args.log_every {
        pipeline = pipeline.with_observer(Box::new(TracingObserver::new(every)));
    }
    if let Some(path) = &args.observations {
        pipeline = pipeline.with_observer(Box::new(
            JsonlObserver::new(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ));
    }
    if let Some(path) = &args.csv {
        pipeline = pipeline.with_observer(Box::new(
            CsvObserver::new(path).with_context(|| format!("failed to create {}", path.display()))?,
        ));
    }

    let result = pipeline.run(&mut agent, &mut env)?;

    print_section("Training Results");
    print_result(&result);
    print_kv("Final epsilon", &format!("{:.2}", agent.epsilon()));
    print_kv("Visited rows", &agent.model().visited_rows().to_string());

    if let Some(path) = &args.summary {
        result
            .save(path)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        println!("\n✓ Summary written to: {}", path.display());
    }

    if let Some(path) = &args.output {
        let metadata = TrainingMetadata {
            episodes_trained: Some(result.episodes),
            best_score: Some(result.best_score),
            seed: args.seed,
            saved_at: None,
        };
        app.save_agent(&agent, metadata, path)
            .with_context(|| format!("failed to save agent to {}", path.display()))?;
        println!("\n✓ Agent saved to: {}", path.display());
    }

    Ok(())
}
