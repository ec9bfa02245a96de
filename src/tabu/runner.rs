//! The Tabu Search Core: one inner run (`spec.md` §4.5).
//!
//! Ground truth for iteration order and the three result statistics is
//! `original_source/printemps/solver/tabu_search/core/tabu_search.h`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::Rng;

use crate::constants::{EPSILON, LARGE_VALUE_100, LARGE_VALUE_50};
use crate::incumbent::{IncumbentHolder, IncumbentUpdate};
use crate::log_table::{LogTable, NeighborhoodCounts, RowMarks};
use crate::memory::{Memory, TabuMode};
use crate::model::{Model, SolutionScore};
use crate::neighborhood::{Move, MoveSense, Neighborhood};

use super::config::{TabuOptions, TabuRunParameters};
use super::types::{MoveScore, TabuSearchResult, TerminationStatus};

/// Stateless driver for one inner run; all mutable state lives in the
/// `Model`/`Neighborhood`/`Memory`/`IncumbentHolder` the caller passes in,
/// matching `spec.md` §3 "Ownership" (nothing here owns solve state across
/// calls).
#[derive(Debug, Default, Clone, Copy)]
pub struct TabuSearchCore;

impl TabuSearchCore {
    pub fn new() -> Self {
        Self
    }

    /// Runs until one of the six termination statuses is reached. `cancel`
    /// is polled at the top of every iteration (`spec.md` §5).
    #[allow(clippy::too_many_arguments)]
    pub fn run<R: Rng>(
        &self,
        model: &mut Model,
        neighborhood: &mut Neighborhood,
        memory: &mut Memory,
        incumbent: &mut IncumbentHolder,
        options: &TabuOptions,
        run: &TabuRunParameters,
        cancel: &AtomicBool,
        rng: &mut R,
        log_table: &LogTable,
    ) -> TabuSearchResult {
        memory.reset_last_update_iterations();
        incumbent.reset_local_augmented();
        neighborhood.reset_run_state();

        let baseline_tenure = run.tabu_tenure;
        let mut tenure = run.tabu_tenure;
        let number_of_mutable = (model.number_of_mutable_variables() as i64).max(1);

        let mut total_status = IncumbentUpdate::empty();
        let mut last_local = -1_i64;
        let mut last_global = -1_i64;
        let mut last_feasible = -1_i64;
        let mut is_found_new_feasible = false;
        let mut is_few_permissible = false;
        let mut local_updates_since_global = 0u32;
        let mut consecutive_increase = 0u32;
        let mut consecutive_decrease = 0u32;
        let mut previous_intensity = memory.primal_intensity();
        let mut previous_move: Option<Move> = None;

        let mut max_objective = f64::NEG_INFINITY;
        let mut min_objective = f64::INFINITY;
        let mut max_global_aug = f64::NEG_INFINITY;
        let mut min_global_aug = f64::INFINITY;
        let mut min_local_penalty_infeasible = f64::INFINITY;
        let mut sum_abs_delta_global_aug = 0.0;
        let mut sum_global_aug = 0.0;
        let mut previous_global_aug = incumbent.global_augmented_objective();

        log_table.print_header();
        log_table.print_initial(model, model.current_score(), incumbent);

        let mut iteration: i64 = 0;
        let termination_status;

        loop {
            if cancel.load(Ordering::Relaxed) {
                termination_status = TerminationStatus::TimeOver;
                break;
            }
            if run.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                termination_status = TerminationStatus::TimeOver;
                break;
            }
            if iteration as usize >= run.max_iterations {
                termination_status = TerminationStatus::IterationOver;
                break;
            }
            if run.target_objective.is_some_and(|target| {
                incumbent.is_found_feasible_solution() && incumbent.feasible_objective() <= target + EPSILON
            }) {
                termination_status = TerminationStatus::ReachTarget;
                break;
            }
            if options
                .pruning_local_update_limit
                .is_some_and(|limit| local_updates_since_global >= limit)
            {
                termination_status = TerminationStatus::EarlyStop;
                break;
            }

            let (accept_all, accept_obj, accept_feas) = run.screening_mode.accept_flags();
            neighborhood.update_moves(model, accept_all, accept_obj, accept_feas);

            let current_score = model.current_score();
            if neighborhood.is_empty() {
                termination_status = if current_score.is_feasible && !current_score.is_objective_improvable {
                    TerminationStatus::Optimal
                } else {
                    TerminationStatus::NoMove
                };
                break;
            }

            if run.is_enabled_shuffle {
                neighborhood.shuffle_moves(rng);
            }
            if run.move_preserve_rate < 1.0 {
                neighborhood.truncate_preserve_rate(run.move_preserve_rate);
            }

            let (scores, move_scores) = evaluate_batch(
                model,
                memory,
                neighborhood.move_ptrs(),
                iteration,
                tenure,
                options.tabu_mode,
                options.frequency_penalty_coefficient,
            );

            let move_count = neighborhood.move_ptrs().len();
            let mut total_scores = vec![0.0; move_count];
            let mut permissible_count = 0usize;
            let mut improvable_count = 0usize;
            let mut feasible_improvable_count = 0usize;
            for i in 0..move_count {
                let mv = &neighborhood.move_ptrs()[i];
                let mut total = scores[i].local_augmented_objective + move_scores[i].frequency_penalty + move_scores[i].lagrangian_penalty;

                if move_scores[i].is_permissible {
                    permissible_count += 1;
                } else {
                    total += LARGE_VALUE_50;
                }

                let improves_objective = scores[i].objective_improvement > EPSILON;
                let improves_feasibility = scores[i].total_violation + EPSILON < current_score.total_violation;
                if improves_objective || improves_feasibility {
                    improvable_count += 1;
                }
                if improves_feasibility {
                    feasible_improvable_count += 1;
                }
                if mv.is_special && !(improves_objective || improves_feasibility) {
                    total += LARGE_VALUE_100;
                }
                total_scores[i] = total;
            }
            is_few_permissible = permissible_count * 4 < move_count;

            let selected_index = if iteration < run.number_of_initial_modification as i64 {
                rng.random_range(0..move_count)
            } else {
                let mut best_idx = 0usize;
                let mut best_total = f64::INFINITY;
                for (i, &total) in total_scores.iter().enumerate() {
                    if total < best_total {
                        best_total = total;
                        best_idx = i;
                    }
                }
                best_idx
            };

            let mut best_global_aug = f64::INFINITY;
            let mut best_global_idx = 0usize;
            for (i, score) in scores.iter().enumerate() {
                if score.global_augmented_objective < best_global_aug {
                    best_global_aug = score.global_augmented_objective;
                    best_global_idx = i;
                }
            }
            let aspirated = best_global_aug + EPSILON < incumbent.global_augmented_objective();
            let chosen_index = if aspirated { best_global_idx } else { selected_index };

            let chosen_move = neighborhood.move_ptrs()[chosen_index].clone();

            model.update(&chosen_move);
            let random_width = (tenure as f64 * options.tabu_tenure_randomize_rate).round() as i64;
            memory.update(&chosen_move, iteration, random_width, rng);
            let update_status = incumbent.try_update(model, model.current_score());
            total_status |= update_status;

            if update_status.contains(IncumbentUpdate::LOCAL) {
                last_local = iteration;
            }
            if update_status.contains(IncumbentUpdate::GLOBAL) {
                last_global = iteration;
                local_updates_since_global = 0;
            } else {
                local_updates_since_global += 1;
            }
            if update_status.contains(IncumbentUpdate::FEASIBLE) {
                last_feasible = iteration;
                is_found_new_feasible = true;
            }

            if chosen_move.is_special
                && matches!(chosen_move.sense, MoveSense::Aggregation | MoveSense::Precedence | MoveSense::VariableBound)
            {
                if let Some(&cid) = chosen_move.related_constraints.first() {
                    neighborhood.mark_special_fired(cid, chosen_move.sense);
                }
            }

            if let Some(prev) = &previous_move {
                if prev.sense.is_chain_compatible() && chosen_move.sense.is_chain_compatible() {
                    let candidate = prev.chain_with(&chosen_move);
                    if !candidate.has_duplicate_variables() {
                        let complement = candidate.complement();
                        neighborhood.register_chain(candidate);
                        neighborhood.register_chain(complement);
                    }
                }
            }
            previous_move = Some(chosen_move);

            if update_status.contains(IncumbentUpdate::GLOBAL) {
                tenure = baseline_tenure;
                consecutive_increase = 0;
                consecutive_decrease = 0;
            } else if (iteration + 1) % (tenure + 1) == 0 {
                let intensity = memory.primal_intensity();
                if intensity > previous_intensity + EPSILON {
                    consecutive_increase += 1;
                    consecutive_decrease = 0;
                } else if intensity < previous_intensity - EPSILON {
                    consecutive_decrease += 1;
                    consecutive_increase = 0;
                }
                if consecutive_increase >= options.bias_increase_threshold {
                    tenure += 1;
                    consecutive_increase = 0;
                }
                if consecutive_decrease >= options.bias_decrease_threshold {
                    tenure -= 1;
                    consecutive_decrease = 0;
                }
                tenure = tenure.clamp((baseline_tenure / 2).max(1), number_of_mutable);
                previous_intensity = intensity;
            }

            let score_now = model.current_score();
            max_objective = max_objective.max(score_now.objective);
            min_objective = min_objective.min(score_now.objective);
            max_global_aug = max_global_aug.max(score_now.global_augmented_objective);
            min_global_aug = min_global_aug.min(score_now.global_augmented_objective);
            sum_abs_delta_global_aug += (score_now.global_augmented_objective - previous_global_aug).abs();
            sum_global_aug += score_now.global_augmented_objective;
            previous_global_aug = score_now.global_augmented_objective;
            for score in &scores {
                if !score.is_feasible {
                    min_local_penalty_infeasible = min_local_penalty_infeasible.min(score.local_penalty);
                }
            }

            log_table.print_row(
                model,
                iteration,
                NeighborhoodCounts {
                    all: move_count,
                    feasible_improvable: feasible_improvable_count,
                    permissible: permissible_count,
                    improvable: improvable_count,
                },
                score_now,
                RowMarks {
                    local: update_status.contains(IncumbentUpdate::LOCAL),
                    global: update_status.contains(IncumbentUpdate::GLOBAL),
                    feasible: update_status.contains(IncumbentUpdate::FEASIBLE),
                },
                incumbent,
            );

            if iteration >= options.auto_break_iteration_threshold as i64
                && score_now.is_feasible
                && min_local_penalty_infeasible.is_finite()
                && min_local_penalty_infeasible > options.auto_break_penalty_multiplier * model.max_abs_objective_sensitivity()
            {
                iteration += 1;
                termination_status = TerminationStatus::EarlyStop;
                break;
            }

            iteration += 1;
        }

        log_table.print_footer();

        let objective_constraint_rate = if min_local_penalty_infeasible.is_finite() {
            let numerator = 1.0_f64
                .max(max_objective.abs().max(min_objective.abs()))
                .max(1.0_f64.max(max_objective - min_objective));
            numerator / min_local_penalty_infeasible.max(1.0)
        } else {
            0.0
        };
        let global_augmented_objective_range = if max_global_aug.is_finite() && min_global_aug.is_finite() {
            (max_global_aug - min_global_aug).max(0.0)
        } else {
            0.0
        };
        let performance = {
            let denominator = (sum_global_aug - iteration as f64 * incumbent.global_augmented_objective()).max(1.0);
            sum_abs_delta_global_aug / denominator
        };

        TabuSearchResult {
            total_update_status: total_status,
            number_of_iterations: iteration as usize,
            termination_status,
            tabu_tenure: tenure,
            last_local_incumbent_update_iteration: last_local,
            last_global_incumbent_update_iteration: last_global,
            last_feasible_incumbent_update_iteration: last_feasible,
            is_few_permissible_neighborhood: is_few_permissible,
            is_found_new_feasible_solution: is_found_new_feasible,
            objective_constraint_rate,
            global_augmented_objective_range,
            performance,
        }
    }
}

/// Parallel batch evaluation over the candidate slice, each task writing
/// into its own output slot (`spec.md` §5). Falls back to a sequential
/// iterator when the `parallel` feature is off.
#[cfg(feature = "parallel")]
fn evaluate_batch(
    model: &Model,
    memory: &Memory,
    moves: &[Move],
    iteration: i64,
    tenure: i64,
    tabu_mode: TabuMode,
    frequency_penalty_coefficient: f64,
) -> (Vec<SolutionScore>, Vec<MoveScore>) {
    use rayon::prelude::*;

    moves
        .par_iter()
        .map(|mv| {
            let score = model.evaluate(mv);
            let move_score = MoveScore {
                is_permissible: memory.is_permissible(mv, iteration, tenure, tabu_mode),
                frequency_penalty: memory.frequency_penalty(mv, iteration, frequency_penalty_coefficient),
                lagrangian_penalty: 0.0,
            };
            (score, move_score)
        })
        .unzip()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_batch(
    model: &Model,
    memory: &Memory,
    moves: &[Move],
    iteration: i64,
    tenure: i64,
    tabu_mode: TabuMode,
    frequency_penalty_coefficient: f64,
) -> (Vec<SolutionScore>, Vec<MoveScore>) {
    moves
        .iter()
        .map(|mv| {
            let score = model.evaluate(mv);
            let move_score = MoveScore {
                is_permissible: memory.is_permissible(mv, iteration, tenure, tabu_mode),
                frequency_penalty: memory.frequency_penalty(mv, iteration, frequency_penalty_coefficient),
                lagrangian_penalty: 0.0,
            };
            (score, move_score)
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, ConstraintSense, Expression, ExpressionId, Sense, Variable, VariableId};

    fn binary_feasibility_model() -> Model {
        let mut model = Model::new(ExpressionId(0), Sense::Minimize);
        let x = model.add_variable(Variable::binary("x", 0));
        let mut objective = Expression::new(0.0);
        objective.add_term(x, 1.0);
        model.add_expression(objective);

        let mut constraint_expr = Expression::new(-1.0);
        constraint_expr.add_term(x, 1.0);
        let cid = model.add_expression(constraint_expr);
        model.add_constraint(Constraint::new("x >= 1", cid, ConstraintSense::GreaterEqual, 1.0e6));
        model.build().unwrap();
        model
    }

    #[test]
    fn single_variable_run_reaches_feasibility() {
        let mut model = binary_feasibility_model();
        let mut neighborhood = Neighborhood::new();
        neighborhood.two_flip_enabled = false;
        neighborhood.special_enabled = false;
        let mut memory = Memory::new(model.variables().len());
        let mut incumbent = IncumbentHolder::new();
        let options = TabuOptions::default();
        let mut run_params = TabuRunParameters::new(10, options.initial_tabu_tenure);
        run_params.screening_mode = crate::neighborhood::ImprovabilityScreeningMode::Off;
        let cancel = AtomicBool::new(false);
        let mut rng = crate::random::create_rng(1);
        let log_table = LogTable::new(false);

        let core = TabuSearchCore::new();
        let result = core.run(
            &mut model,
            &mut neighborhood,
            &mut memory,
            &mut incumbent,
            &options,
            &run_params,
            &cancel,
            &mut rng,
            &log_table,
        );

        assert!(incumbent.is_found_feasible_solution());
        assert_eq!(incumbent.feasible_objective(), 1.0);
        assert_eq!(model.value(VariableId(0)), 1);
        assert!(result.number_of_iterations <= 2);
    }

    #[test]
    fn all_fixed_variables_terminate_immediately() {
        let mut model = {
            let mut m = Model::new(ExpressionId(0), Sense::Minimize);
            let x = m.add_variable(Variable::binary("x", 0));
            let mut objective = Expression::new(0.0);
            objective.add_term(x, 1.0);
            m.add_expression(objective);
            m.build().unwrap();
            m
        };

        let mut neighborhood = Neighborhood::new();
        let mut memory = Memory::new(1);
        let mut incumbent = IncumbentHolder::new();
        let options = TabuOptions::default();
        let run_params = TabuRunParameters::new(10, options.initial_tabu_tenure);
        let cancel = AtomicBool::new(false);
        let mut rng = crate::random::create_rng(1);
        let log_table = LogTable::new(false);

        neighborhood.special_enabled = false;
        neighborhood.two_flip_enabled = false;
        neighborhood.selection_enabled = false;
        neighborhood.integer_enabled = false;
        neighborhood.binary_enabled = false;

        let core = TabuSearchCore::new();
        let result = core.run(
            &mut model,
            &mut neighborhood,
            &mut memory,
            &mut incumbent,
            &options,
            &run_params,
            &cancel,
            &mut rng,
            &log_table,
        );

        assert_eq!(result.number_of_iterations, 0);
        assert_eq!(result.termination_status, TerminationStatus::Optimal);
    }

    #[test]
    fn cancellation_token_stops_the_run() {
        let mut model = binary_feasibility_model();
        let mut neighborhood = Neighborhood::new();
        let mut memory = Memory::new(model.variables().len());
        let mut incumbent = IncumbentHolder::new();
        let options = TabuOptions::default();
        let run_params = TabuRunParameters::new(1000, options.initial_tabu_tenure);
        let cancel = AtomicBool::new(true);
        let mut rng = crate::random::create_rng(1);
        let log_table = LogTable::new(false);

        let core = TabuSearchCore::new();
        let result = core.run(
            &mut model,
            &mut neighborhood,
            &mut memory,
            &mut incumbent,
            &options,
            &run_params,
            &cancel,
            &mut rng,
            &log_table,
        );

        assert_eq!(result.termination_status, TerminationStatus::TimeOver);
        assert_eq!(result.number_of_iterations, 0);
    }
}
