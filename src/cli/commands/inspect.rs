//! Inspect command - Summarize a saved agent's model

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;

use crate::{
    agent::MdpAgent,
    app::App,
    cli::output::{format_number, print_kv, print_section},
    discretizer::StateCell,
    policy::ActionValues,
    types::{Action, StateIndex},
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a saved agent")]
pub struct InspectArgs {
    /// Path to saved agent file
    pub agent: PathBuf,

    /// Show the learned dynamics of a single state
    #[arg(long)]
    pub state: Option<usize>,

    /// Number of most visited states to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Print JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StateReport {
    index: usize,
    cell: StateCell,
    visits: u64,
    reward: f64,
    value: f64,
    action_values: ActionValues,
    best_action: Action,
}

#[derive(Debug, Serialize)]
struct TransitionReport {
    action: Action,
    visits: u64,
    /// Successor states with non-zero probability
    successors: Vec<(usize, f64)>,
}

fn describe(cell: &StateCell) -> String {
    match cell {
        StateCell::Fail => "FAIL".to_string(),
        StateCell::NoObstacle => "no obstacle".to_string(),
        StateCell::Obstacle {
            obstacle,
            config,
            dx,
        } => format!("{obstacle} config={config} dx={dx:.0}"),
    }
}

fn state_report(agent: &MdpAgent, index: usize) -> Result<StateReport> {
    let state = StateIndex::new(index);
    let cell = agent.discretizer().decode(state).ok_or_else(|| {
        anyhow!(
            "state {index} is out of range (model has {} states)",
            agent.model().num_states()
        )
    })?;
    let model = agent.model();
    let action_values = ActionValues::of(model, state);

    Ok(StateReport {
        index,
        cell,
        visits: Action::ALL.iter().map(|&a| model.visits(state, a)).sum(),
        reward: model.reward(state),
        value: model.value(state),
        best_action: action_values.best(),
        action_values,
    })
}

fn transitions(agent: &MdpAgent, index: usize) -> Vec<TransitionReport> {
    let state = StateIndex::new(index);
    let model = agent.model();
    Action::ALL
        .iter()
        .map(|&action| TransitionReport {
            action,
            visits: model.visits(state, action),
            successors: model
                .transition_probs(state, action)
                .iter()
                .enumerate()
                .filter(|&(_, &p)| p > 0.0)
                .map(|(next, &p)| (next, p))
                .collect(),
        })
        .collect()
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let app = App::new();
    let saved = app
        .load_snapshot(&args.agent)
        .with_context(|| format!("failed to load agent from {}", args.agent.display()))?;
    let agent = saved.to_agent()?;
    let model = agent.model();

    if let Some(index) = args.state {
        let report = state_report(&agent, index)?;
        let dynamics = transitions(&agent, index);

        if args.json {
            let value = serde_json::json!({ "state": report, "transitions": dynamics });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        print_section(&format!("State {index}: {}", describe(&report.cell)));
        print_kv("Visits", &format_number(report.visits as usize));
        print_kv("Reward", &format!("{:.3}", report.reward));
        print_kv("Value", &format!("{:.3}", report.value));
        print_kv("Best action", &report.best_action.to_string());
        for transition in dynamics {
            println!(
                "\n  {} ({} visits)",
                transition.action,
                format_number(transition.visits as usize)
            );
            for (next, p) in transition.successors {
                println!("    -> {next:4} p={p:.3}");
            }
        }
        return Ok(());
    }

    let mut visited: Vec<StateReport> = (0..model.num_states())
        .filter_map(|index| state_report(&agent, index).ok())
        .filter(|r| r.visits > 0)
        .collect();
    visited.sort_by(|a, b| b.visits.cmp(&a.visits).then(a.index.cmp(&b.index)));
    visited.truncate(args.top);

    if args.json {
        let value = serde_json::json!({
            "config": saved.config(),
            "metadata": saved.metadata,
            "epsilon": saved.epsilon(),
            "episodes": saved.episodes(),
            "num_states": model.num_states(),
            "visited_rows": model.visited_rows(),
            "total_transitions": model.total_transitions(),
            "top_states": visited,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_section("Agent");
    print_kv("Format version", &saved.version.to_string());
    print_kv("Episodes", &format_number(saved.episodes()));
    print_kv("Epsilon", &format!("{:.2}", saved.epsilon()));
    print_kv("Gamma", &saved.config().gamma.to_string());
    print_kv("Backup", &format!("{:?}", saved.config().backup));
    if let Some(best) = saved.metadata.best_score {
        print_kv("Best score", &format_number(best));
    }

    print_section("Model");
    print_kv("States", &format_number(model.num_states()));
    print_kv("Visited rows", &format_number(model.visited_rows()));
    print_kv("Transitions", &format_number(model.total_transitions() as usize));

    if !visited.is_empty() {
        print_section("Most visited states");
        println!(
            "  {:>5}  {:<32} {:>8} {:>12}  best",
            "state", "cell", "visits", "value"
        );
        for report in &visited {
            println!(
                "  {:>5}  {:<32} {:>8} {:>12.3}  {}",
                report.index,
                describe(&report.cell),
                report.visits,
                report.value,
                report.best_action
            );
        }
    }

    Ok(())
}
