//! Criterion benchmarks for the tabu-search engine.
//!
//! Uses a synthetic multi-knapsack: `n` binary items split across a few
//! capacity constraints, random weights and values, scaled to measure pure
//! search overhead independent of any real model file.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};

use tabu_mip::controller::{Controller, ControllerOptions};
use tabu_mip::model::{Constraint, ConstraintSense, Expression, ExpressionId, Model, Sense, Variable};
use tabu_mip::tabu::TabuOptions;

/// Builds `n` binary items spread across `constraints` knapsack capacity
/// rows, with weights and values drawn from a fixed seed so every
/// benchmark iteration solves the identical instance.
fn build_knapsack(n: usize, constraints: usize, seed: u64) -> Model {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut model = Model::new(ExpressionId(0), Sense::Maximize);

    let mut variable_ids = Vec::with_capacity(n);
    for i in 0..n {
        variable_ids.push(model.add_variable(Variable::binary(format!("item{i}"), 0)));
    }

    let mut objective = Expression::new(0.0);
    let values: Vec<f64> = (0..n).map(|_| rng.random_range(1.0..50.0)).collect();
    for (&var, &value) in variable_ids.iter().zip(&values) {
        objective.add_term(var, value);
    }
    model.add_expression(objective);

    for row in 0..constraints {
        let weights: Vec<f64> = (0..n).map(|_| rng.random_range(1.0..20.0)).collect();
        let capacity = weights.iter().sum::<f64>() * 0.4;
        let mut expr = Expression::new(-capacity);
        for (&var, &weight) in variable_ids.iter().zip(&weights) {
            expr.add_term(var, weight);
        }
        let expr_id = model.add_expression(expr);
        model.add_constraint(Constraint::new(
            format!("capacity{row}"),
            expr_id,
            ConstraintSense::LessEqual,
            1.0e6,
        ));
    }

    model.build().expect("synthetic knapsack model must build");
    model
}

fn bench_knapsack(c: &mut Criterion) {
    let mut group = c.benchmark_group("tabu_knapsack");
    group.sample_size(10);

    for &(items, rows) in &[(20usize, 2usize), (50, 3), (100, 4)] {
        let controller_options = ControllerOptions::default()
            .with_seed(Some(42))
            .with_outer_iteration_max(10)
            .with_inner_iteration_max(100);
        let tabu_options = TabuOptions::default();

        group.bench_with_input(
            BenchmarkId::new(format!("items{items}_rows{rows}"), items),
            &(items, rows),
            |b, &(items, rows)| {
                b.iter(|| {
                    let mut model = build_knapsack(items, rows, 7);
                    let result = Controller::new().solve(black_box(&mut model), &controller_options, &tabu_options);
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_knapsack);
criterion_main!(benches);
