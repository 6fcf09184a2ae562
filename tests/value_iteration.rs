//! Convergence properties of value iteration

mod common;

use common::{approx_eq_tol, record_random};
use dino_mdp::{MdpModel, ValueIteration, mdp::BackupActions};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn random_model(seed: u64, num_states: usize) -> MdpModel {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = MdpModel::new(num_states).unwrap();
    record_random(&mut model, num_states * 20, &mut rng);
    model.estimate();
    model
}

/// Iterate sweeps by hand from `initial` until the residual is tiny.
fn iterate_from(solver: &ValueIteration, model: &MdpModel, initial: Vec<f64>) -> Vec<f64> {
    let mut current = initial;
    let mut next = vec![0.0; current.len()];
    for _ in 0..100_000 {
        let residual = solver.sweep(model, &current, &mut next);
        std::mem::swap(&mut current, &mut next);
        if residual < 1e-10 {
            return current;
        }
    }
    panic!("value iteration did not settle");
}

#[test]
fn test_fixed_point_is_independent_of_initial_values() {
    let model = random_model(17, 10);
    let solver = ValueIteration::new(0.8, 1e-10);
    let mut rng = StdRng::seed_from_u64(3);

    let from_zero = iterate_from(&solver, &model, vec![0.0; 10]);
    for _ in 0..5 {
        let initial: Vec<f64> = (0..10).map(|_| rng.random_range(-1e5..1e5)).collect();
        let from_random = iterate_from(&solver, &model, initial);
        for (a, b) in from_zero.iter().zip(&from_random) {
            assert!(approx_eq_tol(*a, *b, 1e-6), "{a} != {b}");
        }
    }
}

#[test]
fn test_solve_matches_manual_iteration() {
    let mut model = random_model(23, 9);
    let solver = ValueIteration::new(0.9, 1e-10);
    let expected = iterate_from(&solver, &model, vec![0.0; 9]);

    let report = solver.solve(&mut model);

    assert!(report.converged);
    assert!(report.residual < 1e-10);
    for (a, b) in model.values().iter().zip(&expected) {
        assert!(approx_eq_tol(*a, *b, 1e-6));
    }
}

#[test]
fn test_residual_contracts_by_gamma() {
    let model = random_model(41, 8);
    let gamma = 0.7;
    let solver = ValueIteration::new(gamma, 1e-12);

    let mut current = vec![0.0; 8];
    let mut next = vec![0.0; 8];
    let mut previous = solver.sweep(&model, &current, &mut next);
    for _ in 0..30 {
        std::mem::swap(&mut current, &mut next);
        let residual = solver.sweep(&model, &current, &mut next);
        assert!(residual <= gamma * previous + 1e-9);
        previous = residual;
    }
}

#[test]
fn test_warm_start_converges_in_fewer_sweeps() {
    let mut model = random_model(8, 12);
    let solver = ValueIteration::new(0.95, 1e-6);
    let cold = solver.solve(&mut model);
    let warm = solver.solve(&mut model);

    assert!(cold.converged && warm.converged);
    assert!(warm.sweeps < cold.sweeps);
}

#[test]
fn test_full_backup_never_lowers_values() {
    let model = random_model(12, 10);
    let mut partial = model.clone();
    let mut full = model;

    ValueIteration::new(0.9, 1e-10).solve(&mut partial);
    ValueIteration::new(0.9, 1e-10)
        .with_backup(BackupActions::All)
        .solve(&mut full);

    for (p, f) in partial.values().iter().zip(full.values()) {
        assert!(*f >= *p - 1e-6);
    }
}
