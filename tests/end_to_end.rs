//! End-to-end solves on small hand-built models, one per scenario this
//! engine is expected to handle correctly.

use proptest::prelude::*;

use tabu_mip::controller::{Controller, ControllerOptions};
use tabu_mip::model::{Constraint, ConstraintSense, Expression, ExpressionId, Model, Sense, Variable};
use tabu_mip::solution::TerminationReason;
use tabu_mip::tabu::TabuOptions;

fn controller_options(seed: u64) -> ControllerOptions {
    ControllerOptions::default()
        .with_seed(Some(seed))
        .with_outer_iteration_max(30)
        .with_inner_iteration_max(200)
}

/// `min x1 s.t. x1 >= 1, x1 in {0,1}`.
#[test]
fn single_variable_binary_feasibility() {
    let mut model = Model::new(ExpressionId(0), Sense::Minimize);
    let x1 = model.add_variable(Variable::binary("x1", 0));

    let mut objective = Expression::new(0.0);
    objective.add_term(x1, 1.0);
    model.add_expression(objective);

    let mut constraint_expr = Expression::new(-1.0);
    constraint_expr.add_term(x1, 1.0);
    let constraint_expr_id = model.add_expression(constraint_expr);
    model.add_constraint(Constraint::new("x1 >= 1", constraint_expr_id, ConstraintSense::GreaterEqual, 1.0e6));
    model.build().unwrap();

    let (solution, status, _archive) = Controller::new()
        .solve(&mut model, &controller_options(1), &TabuOptions::default())
        .unwrap();

    assert!(solution.is_feasible);
    assert_eq!(solution.objective, 1.0);
    assert_eq!(solution.variable_values, vec![("x1".to_string(), 1)]);
    assert!(status.total_inner_iterations > 0);
}

/// `x1..x4 in {0,1}, sum xi = 1, min 4x1 + 3x2 + 2x3 + x4`, starting at `x1 = 1`.
#[test]
fn selection_constraint_finds_cheapest_member() {
    let mut model = Model::new(ExpressionId(0), Sense::Minimize);
    let x1 = model.add_variable(Variable::binary("x1", 1));
    let x2 = model.add_variable(Variable::binary("x2", 0));
    let x3 = model.add_variable(Variable::binary("x3", 0));
    let x4 = model.add_variable(Variable::binary("x4", 0));

    let mut objective = Expression::new(0.0);
    objective.add_term(x1, 4.0);
    objective.add_term(x2, 3.0);
    objective.add_term(x3, 2.0);
    objective.add_term(x4, 1.0);
    model.add_expression(objective);

    let mut selection_expr = Expression::new(-1.0);
    selection_expr.add_term(x1, 1.0);
    selection_expr.add_term(x2, 1.0);
    selection_expr.add_term(x3, 1.0);
    selection_expr.add_term(x4, 1.0);
    let selection_expr_id = model.add_expression(selection_expr);
    model.add_constraint(Constraint::new("sum = 1", selection_expr_id, ConstraintSense::Equal, 1.0e6));
    model.add_selection_group(vec![x1, x2, x3, x4]);
    model.build().unwrap();

    let (solution, _status, _archive) = Controller::new()
        .solve(&mut model, &controller_options(2), &TabuOptions::default())
        .unwrap();

    assert!(solution.is_feasible);
    assert_eq!(solution.objective, 1.0);
    let values: std::collections::HashMap<_, _> = solution.variable_values.into_iter().collect();
    assert_eq!(values["x4"], 1);
    assert_eq!(values["x1"], 0);
    assert_eq!(values["x2"], 0);
    assert_eq!(values["x3"], 0);
}

/// `max 10a + 13b + 18c s.t. 5a + 7b + 9c <= 12, a,b,c in {0,1}`.
#[test]
fn knapsack_reaches_known_optimum() {
    let mut model = Model::new(ExpressionId(0), Sense::Maximize);
    let a = model.add_variable(Variable::binary("a", 0));
    let b = model.add_variable(Variable::binary("b", 0));
    let c = model.add_variable(Variable::binary("c", 0));

    let mut objective = Expression::new(0.0);
    objective.add_term(a, 10.0);
    objective.add_term(b, 13.0);
    objective.add_term(c, 18.0);
    model.add_expression(objective);

    let mut capacity_expr = Expression::new(-12.0);
    capacity_expr.add_term(a, 5.0);
    capacity_expr.add_term(b, 7.0);
    capacity_expr.add_term(c, 9.0);
    let capacity_expr_id = model.add_expression(capacity_expr);
    model.add_constraint(Constraint::new("capacity", capacity_expr_id, ConstraintSense::LessEqual, 1.0e6));
    model.build().unwrap();

    let (solution, _status, _archive) = Controller::new()
        .solve(&mut model, &controller_options(3), &TabuOptions::default())
        .unwrap();

    // a+c (14) exceeds the capacity of 12; the true optimum is a+b (weight
    // 12, value 23), not a+c as a naive reading of the item values alone
    // might suggest.
    assert!(solution.is_feasible);
    assert_eq!(solution.objective, 23.0);
    let values: std::collections::HashMap<_, _> = solution.variable_values.into_iter().collect();
    assert_eq!(values["a"], 1);
    assert_eq!(values["b"], 1);
    assert_eq!(values["c"], 0);
}

/// `min x s.t. x >= 5, x <= 3, x in [0, 10]` — infeasible by construction.
#[test]
fn infeasible_model_returns_best_effort_with_violation() {
    let mut model = Model::new(ExpressionId(0), Sense::Minimize);
    let x = model.add_variable(Variable::new("x", Some(0), Some(10), 0));

    let mut objective = Expression::new(0.0);
    objective.add_term(x, 1.0);
    model.add_expression(objective);

    let mut ge_expr = Expression::new(-5.0);
    ge_expr.add_term(x, 1.0);
    let ge_expr_id = model.add_expression(ge_expr);
    model.add_constraint(Constraint::new("x >= 5", ge_expr_id, ConstraintSense::GreaterEqual, 100.0));

    let mut le_expr = Expression::new(-3.0);
    le_expr.add_term(x, 1.0);
    let le_expr_id = model.add_expression(le_expr);
    model.add_constraint(Constraint::new("x <= 3", le_expr_id, ConstraintSense::LessEqual, 100.0));
    model.build().unwrap();

    let options = controller_options(4).with_outer_iteration_max(10).with_inner_iteration_max(50);
    let (solution, status, _archive) = Controller::new().solve(&mut model, &options, &TabuOptions::default()).unwrap();

    assert!(!solution.is_feasible);
    assert!(solution.total_violation > 0.0);
    assert_ne!(status.termination_reason, TerminationReason::ReachedTarget);
}

/// `x1,x2,x3,x4 in {0,1}, x1+x2 = x3+x4, min x1+x2+x3+x4` — a chain-friendly
/// structure: flipping one side alone cannot restore feasibility, so the
/// two-variable-per-side coordinated flip this test registers directly
/// against a [`tabu_mip::neighborhood::Neighborhood`] is the kind of
/// candidate a long solve on this model would discover on its own.
#[test]
fn chain_move_of_two_binary_flips_is_registered() {
    use tabu_mip::model::{ConstraintId, VariableId};
    use tabu_mip::neighborhood::{Move, MoveSense, Neighborhood};

    let x1 = VariableId(0);
    let x3 = VariableId(2);
    let balance = ConstraintId(0);

    let flip_x1 = Move::new(vec![(x1, 0)], MoveSense::BinaryFlip, vec![balance]);
    let flip_x3 = Move::new(vec![(x3, 1)], MoveSense::BinaryFlip, vec![balance]);
    let chained = flip_x1.chain_with(&flip_x3);

    let mut neighborhood = Neighborhood::new();
    neighborhood.register_chain(chained);

    assert_eq!(neighborhood.chain_pool().len(), 1);
    assert_eq!(neighborhood.chain_pool()[0].alterations.len(), 2);
}

/// Solving the same structure end to end still reaches feasibility, even
/// though no single-variable flip can restore the balance on its own.
#[test]
fn balance_constraint_needing_coordinated_flips_is_solved() {
    let mut model = Model::new(ExpressionId(0), Sense::Minimize);
    let x1 = model.add_variable(Variable::binary("x1", 1));
    let x2 = model.add_variable(Variable::binary("x2", 1));
    let x3 = model.add_variable(Variable::binary("x3", 0));
    let x4 = model.add_variable(Variable::binary("x4", 0));

    let mut objective = Expression::new(0.0);
    objective.add_term(x1, 1.0);
    objective.add_term(x2, 1.0);
    objective.add_term(x3, 1.0);
    objective.add_term(x4, 1.0);
    model.add_expression(objective);

    let mut balance_expr = Expression::new(0.0);
    balance_expr.add_term(x1, 1.0);
    balance_expr.add_term(x2, 1.0);
    balance_expr.add_term(x3, -1.0);
    balance_expr.add_term(x4, -1.0);
    let balance_expr_id = model.add_expression(balance_expr);
    model.add_constraint(Constraint::new("x1+x2 = x3+x4", balance_expr_id, ConstraintSense::Equal, 1.0e6));
    model.build().unwrap();

    let options = controller_options(5).with_outer_iteration_max(20).with_inner_iteration_max(500);
    let (solution, _status, _archive) = Controller::new().solve(&mut model, &options, &TabuOptions::default()).unwrap();

    assert!(solution.is_feasible);
}

/// Trivially infeasible binary problem with an initial penalty too small
/// to push the solver to feasibility in one inner run; the controller's
/// tightening step should still reach feasibility within the outer budget.
#[test]
fn penalty_tightening_eventually_reaches_feasibility() {
    let mut model = Model::new(ExpressionId(0), Sense::Minimize);
    let x1 = model.add_variable(Variable::binary("x1", 0));
    let x2 = model.add_variable(Variable::binary("x2", 0));

    let mut objective = Expression::new(0.0);
    objective.add_term(x1, 1.0);
    objective.add_term(x2, -5.0);
    model.add_expression(objective);

    let mut constraint_expr = Expression::new(-1.0);
    constraint_expr.add_term(x1, 1.0);
    constraint_expr.add_term(x2, 1.0);
    let constraint_expr_id = model.add_expression(constraint_expr);
    // A tiny initial penalty: far smaller than the objective's incentive to
    // keep x2 away from 1, so one inner run alone is unlikely to fix it.
    model.add_constraint(Constraint::new("x1+x2 >= 1", constraint_expr_id, ConstraintSense::GreaterEqual, 0.01));
    model.build().unwrap();

    let options = ControllerOptions::default()
        .with_seed(Some(6))
        .with_outer_iteration_max(50)
        .with_inner_iteration_max(100);
    let (solution, _status, _archive) = Controller::new().solve(&mut model, &options, &TabuOptions::default()).unwrap();

    assert!(solution.is_feasible);
}

proptest! {
    /// Testable Property 1: every constraint's violation is non-negative,
    /// and feasibility agrees with the total-violation threshold.
    #[test]
    fn violation_is_never_negative_and_matches_feasibility(initial in 0i64..=1) {
        let mut model = Model::new(ExpressionId(0), Sense::Minimize);
        let x = model.add_variable(Variable::binary("x", initial));
        let mut objective = Expression::new(0.0);
        objective.add_term(x, 1.0);
        model.add_expression(objective);
        let mut constraint_expr = Expression::new(-1.0);
        constraint_expr.add_term(x, 1.0);
        let constraint_expr_id = model.add_expression(constraint_expr);
        model.add_constraint(Constraint::new("x >= 1", constraint_expr_id, ConstraintSense::GreaterEqual, 10.0));
        model.build().unwrap();

        let score = model.current_score();
        prop_assert!(score.total_violation >= 0.0);
        prop_assert_eq!(score.is_feasible, score.total_violation < 1e-5);
    }

    /// Testable Property 5: fast incremental evaluation and full
    /// recomputation agree on the same move.
    #[test]
    fn fast_evaluation_matches_full_recomputation(new_value in 0i64..=1) {
        let mut model = Model::new(ExpressionId(0), Sense::Minimize);
        let x = model.add_variable(Variable::binary("x", 0));
        let mut objective = Expression::new(0.0);
        objective.add_term(x, 2.0);
        model.add_expression(objective);
        let mut constraint_expr = Expression::new(-1.0);
        constraint_expr.add_term(x, 1.0);
        let constraint_expr_id = model.add_expression(constraint_expr);
        model.add_constraint(Constraint::new("x >= 1", constraint_expr_id, ConstraintSense::GreaterEqual, 10.0));
        model.build().unwrap();

        let mv = tabu_mip::neighborhood::Move::new(
            vec![(x, new_value)],
            tabu_mip::neighborhood::MoveSense::BinaryFlip,
            Vec::new(),
        );
        let fast = model.evaluate(&mv);
        model.update(&mv);
        let full = model.evaluate_full();

        prop_assert!((fast.objective - full.objective).abs() < 1e-9);
        prop_assert!((fast.total_violation - full.total_violation).abs() < 1e-9);
    }

    /// Testable Property 8: applying a Move then its inverse restores the
    /// model's variable values exactly.
    #[test]
    fn move_then_inverse_is_identity(initial in 0i64..=1) {
        let mut model = Model::new(ExpressionId(0), Sense::Minimize);
        let x = model.add_variable(Variable::binary("x", initial));
        let mut objective = Expression::new(0.0);
        objective.add_term(x, 1.0);
        model.add_expression(objective);
        model.build().unwrap();

        let mv = tabu_mip::neighborhood::Move::new(
            vec![(x, 1 - initial)],
            tabu_mip::neighborhood::MoveSense::BinaryFlip,
            Vec::new(),
        );
        let inverse = mv.complement();

        model.update(&mv);
        model.update(&inverse);
        prop_assert_eq!(model.value(x), initial);
    }
}
