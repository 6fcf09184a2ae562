//! Tests for the training pipeline and its observers

mod common;

use std::sync::{Arc, Mutex};

use common::{ScriptedRunner, cactus};
use dino_mdp::{
    MdpAgent,
    agent::{EpisodeSummary, StepOutcome},
    app::AgentConfig,
    env::{RunnerConfig, SimulatedRunner},
    pipeline::{
        CsvObserver, EpisodeRecord, JsonlObserver, MetricsObserver, Observer, TrainingConfig,
        TrainingPipeline, TrainingResult,
    },
};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    TrainingStart(usize),
    EpisodeStart(usize),
    Step(usize, usize),
    EpisodeEnd(usize, usize),
    TrainingEnd,
}

/// Records every callback into a shared log.
struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Observer for Recorder {
    fn on_training_start(&mut self, total_episodes: usize) -> dino_mdp::Result<()> {
        self.events.lock().unwrap().push(Event::TrainingStart(total_episodes));
        Ok(())
    }

    fn on_episode_start(&mut self, episode: usize) -> dino_mdp::Result<()> {
        self.events.lock().unwrap().push(Event::EpisodeStart(episode));
        Ok(())
    }

    fn on_step(&mut self, episode: usize, step: usize, _outcome: &StepOutcome) -> dino_mdp::Result<()> {
        self.events.lock().unwrap().push(Event::Step(episode, step));
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> dino_mdp::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(Event::EpisodeEnd(summary.episode, summary.steps));
        Ok(())
    }

    fn on_training_end(&mut self) -> dino_mdp::Result<()> {
        self.events.lock().unwrap().push(Event::TrainingEnd);
        Ok(())
    }
}

fn agent(seed: u64) -> MdpAgent {
    MdpAgent::new(AgentConfig::new().with_distance_buckets(4, 300.0).with_seed(seed)).unwrap()
}

#[test]
fn test_observer_event_sequence() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = TrainingPipeline::new(TrainingConfig::new(2)).with_observer(Box::new(Recorder {
        events: Arc::clone(&events),
    }));
    let mut agent = agent(1);
    let mut env = ScriptedRunner::new(vec![None, cactus(200.0), cactus(0.0)]);

    let result = pipeline.run(&mut agent, &mut env).unwrap();

    let expected = vec![
        Event::TrainingStart(2),
        Event::EpisodeStart(0),
        Event::Step(0, 0),
        Event::Step(0, 1),
        Event::EpisodeEnd(0, 2),
        Event::EpisodeStart(1),
        Event::Step(1, 0),
        Event::Step(1, 1),
        Event::EpisodeEnd(1, 2),
        Event::TrainingEnd,
    ];
    assert_eq!(*events.lock().unwrap(), expected);
    assert_eq!(result.total_steps, 4);
    assert_eq!(result.crashes, 2);
    // one initial start plus one restart per episode
    assert_eq!(env.starts, 3);
}

#[test]
fn test_step_cap_cuts_episodes_without_crash() {
    let mut pipeline = TrainingPipeline::new(TrainingConfig::new(3).with_max_steps(2));
    let mut agent = agent(2);
    let mut env = ScriptedRunner::new(vec![None, cactus(300.0), cactus(200.0), cactus(100.0), cactus(0.0)]);

    let result = pipeline.run(&mut agent, &mut env).unwrap();

    assert_eq!(result.episodes, 3);
    assert_eq!(result.best_score, 2);
    assert_eq!(result.crashes, 0);
    assert_eq!(agent.model().total_transitions(), 6);
}

#[test]
fn test_same_seeds_reproduce_training() {
    let run = || {
        let mut agent = MdpAgent::new(AgentConfig::new().with_initial_epsilon(0.5)).unwrap();
        let mut env = SimulatedRunner::new(RunnerConfig::new().with_seed(5)).unwrap();
        let result = TrainingPipeline::new(TrainingConfig::new(15).with_max_steps(3_000).with_seed(77))
            .run(&mut agent, &mut env)
            .unwrap();
        (result, agent.model().clone())
    };

    let (first_result, first_model) = run();
    let (second_result, second_model) = run();
    assert_eq!(first_result, second_result);
    assert_eq!(first_model, second_model);
}

#[test]
fn test_file_observers_write_every_episode() {
    let temp_dir = TempDir::new().unwrap();
    let jsonl = temp_dir.path().join("episodes.jsonl");
    let csv_path = temp_dir.path().join("episodes.csv");

    let mut pipeline = TrainingPipeline::new(TrainingConfig::new(4).with_max_steps(1_000))
        .with_observer(Box::new(JsonlObserver::new(&jsonl).unwrap()))
        .with_observer(Box::new(CsvObserver::new(&csv_path).unwrap()))
        .with_observer(Box::new(MetricsObserver::new()));
    let mut agent = agent(3);
    let mut env = SimulatedRunner::new(RunnerConfig::new().with_seed(3)).unwrap();
    let result = pipeline.run(&mut agent, &mut env).unwrap();
    drop(pipeline);

    let lines: Vec<EpisodeRecord> = std::fs::read_to_string(&jsonl)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines.iter().map(|r| r.steps).sum::<usize>(),
        result.total_steps
    );
    assert!(lines.iter().all(|r| r.sweeps.is_some()));

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<EpisodeRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
    let key = |r: &EpisodeRecord| (r.episode, r.steps, r.crashed, r.sweeps);
    assert_eq!(
        rows.iter().map(key).collect::<Vec<_>>(),
        lines.iter().map(key).collect::<Vec<_>>()
    );
}

#[test]
fn test_training_result_json_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("summary.json");

    let mut agent = agent(4);
    let mut env = ScriptedRunner::new(vec![None, cactus(0.0)]);
    let result = TrainingPipeline::new(TrainingConfig::new(3))
        .run(&mut agent, &mut env)
        .unwrap();

    result.save(&path).unwrap();
    assert_eq!(TrainingResult::load(&path).unwrap(), result);
}

#[test]
fn test_evaluation_does_not_learn() {
    let mut agent = agent(6);
    let mut env = SimulatedRunner::new(RunnerConfig::new().with_seed(6)).unwrap();
    TrainingPipeline::new(TrainingConfig::new(5).with_max_steps(1_000))
        .run(&mut agent, &mut env)
        .unwrap();
    let model = agent.model().clone();

    let events = Arc::new(Mutex::new(Vec::new()));
    let result = TrainingPipeline::new(TrainingConfig::new(3).with_max_steps(1_000))
        .with_observer(Box::new(Recorder {
            events: Arc::clone(&events),
        }))
        .evaluate(&mut agent, &mut env)
        .unwrap();

    assert_eq!(agent.model(), &model);
    assert_eq!(result.unconverged_refits, 0);
    let steps = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, Event::Step(..)))
        .count();
    assert_eq!(steps, result.total_steps);
}
