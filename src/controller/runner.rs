//! The Controller: repeatedly calls [`crate::tabu::TabuSearchCore`], then
//! adapts penalties, tenure, and the neighborhood between calls
//! (`spec.md` §4.6, §6).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::SolverResult;
use crate::incumbent::{IncumbentHolder, Solution};
use crate::log_table::LogTable;
use crate::memory::Memory;
use crate::model::Model;
use crate::neighborhood::{Move, MoveSense, Neighborhood};
use crate::random::create_rng;
use crate::solution::{ArchivedSolution, NamedSolution, SolutionArchive, StatusRecord, TerminationReason};
use crate::tabu::{TabuOptions, TabuRunParameters, TabuSearchCore, TerminationStatus};

use super::config::{ControllerOptions, Verbose};
use super::state::{ControllerState, RestartChoice};

/// Drives the outer loop of the solve: one call into
/// [`TabuSearchCore::run`] per outer iteration, with the controller
/// adapting penalties, tabu tenure, and the neighborhood in between
/// (`spec.md` §2 "Controller → (configure run) → TabuSearchCore").
#[derive(Debug, Clone, Copy, Default)]
pub struct Controller;

impl Controller {
    pub fn new() -> Self {
        Self
    }

    /// Solves `model` in place, returning the best feasible solution found
    /// (or the best infeasible one, if the budget ran out before any
    /// feasible solution was reached) plus a [`StatusRecord`] summarising
    /// the run.
    pub fn solve(
        &self,
        model: &mut Model,
        controller_options: &ControllerOptions,
        tabu_options: &TabuOptions,
    ) -> SolverResult<(NamedSolution, StatusRecord, SolutionArchive)> {
        self.solve_with_cancel(model, controller_options, tabu_options, None)
    }

    /// As [`Controller::solve`], but polls `cancel` (if given) at the top
    /// of every inner iteration, matching `spec.md` §5's cancellation
    /// contract.
    pub fn solve_with_cancel(
        &self,
        model: &mut Model,
        controller_options: &ControllerOptions,
        tabu_options: &TabuOptions,
        cancel: Option<Arc<AtomicBool>>,
    ) -> SolverResult<(NamedSolution, StatusRecord, SolutionArchive)> {
        controller_options.validate()?;
        tabu_options.validate()?;

        let start = Instant::now();
        let deadline = start + controller_options.time_max;
        let cancel = cancel.unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        let mut rng = create_rng(controller_options.seed.unwrap_or(0));

        let mut neighborhood = Neighborhood::new();
        neighborhood.chain_capacity = controller_options.chain_move_capacity;
        if !controller_options.is_enabled_chain_move {
            neighborhood.chain_enabled = false;
        }

        let mut memory = Memory::new(model.variables().len());
        let mut incumbent = IncumbentHolder::new();
        let mut state = ControllerState::new(controller_options, tabu_options, model.constraints().len());

        let inner_log_table = LogTable::new(controller_options.verbose >= Verbose::Full);
        let mut archive = SolutionArchive::new(
            controller_options.solution_archive_capacity,
            controller_options.is_enabled_solution_archive_dedupe,
        );

        // Seed the incumbent with the model's starting assignment so the
        // restart table has something to compare against on the first
        // outer iteration.
        let seed_score = model.current_score();
        incumbent.try_update(model, seed_score);

        let mut outer_iteration = 0usize;
        let mut total_inner_iterations = 0usize;
        let mut last_inner_status = TerminationStatus::IterationOver;
        let mut previous_restart_solution = Solution::capture(model);
        let mut local_update_count = 0usize;
        let mut global_update_count = 0usize;
        let mut feasible_update_count = 0usize;

        info!(
            "controller start: outer_iteration_max={} inner_iteration_max={}",
            controller_options.outer_iteration_max, controller_options.inner_iteration_max
        );

        loop {
            if cancel.load(Ordering::Relaxed) {
                warn!("controller: cancelled after {outer_iteration} outer iterations");
                break;
            }
            if Instant::now() >= deadline {
                debug!("controller: time budget exhausted after {outer_iteration} outer iterations");
                break;
            }
            if outer_iteration >= controller_options.outer_iteration_max {
                debug!("controller: outer iteration budget exhausted");
                break;
            }
            if let Some(target) = controller_options.target_objective {
                if incumbent.is_found_feasible_solution() && incumbent.feasible_objective() <= target {
                    info!("controller: reached target objective {target}");
                    break;
                }
            }

            let run = TabuRunParameters {
                max_iterations: state.inner_iteration_max,
                deadline: Some(deadline),
                target_objective: controller_options.target_objective,
                tabu_tenure: state.tabu_tenure,
                screening_mode: state.screening_mode,
                move_preserve_rate: 1.0,
                is_enabled_shuffle: true,
                number_of_initial_modification: state.number_of_initial_modification,
            };

            let result = TabuSearchCore::new().run(
                model,
                &mut neighborhood,
                &mut memory,
                &mut incumbent,
                tabu_options,
                &run,
                cancel.as_ref(),
                &mut rng,
                &inner_log_table,
            );

            total_inner_iterations += result.number_of_iterations;
            last_inner_status = result.termination_status;

            if result.total_update_status.contains(crate::incumbent::IncumbentUpdate::LOCAL) {
                local_update_count += 1;
            }
            if result.total_update_status.contains(crate::incumbent::IncumbentUpdate::GLOBAL) {
                global_update_count += 1;
            }
            if result.total_update_status.contains(crate::incumbent::IncumbentUpdate::FEASIBLE) {
                feasible_update_count += 1;
            }

            if let Some(feasible_solution) = archive_candidate(model, &incumbent, &result) {
                archive.push(feasible_solution);
            }

            let current_primal_intensity = memory.primal_intensity();
            let restart = state.update(
                controller_options,
                tabu_options,
                model,
                &mut neighborhood,
                &incumbent,
                &result,
                current_primal_intensity,
                &mut rng,
            );

            if controller_options.verbose >= Verbose::Outer {
                info!(
                    "outer {outer_iteration}: inner_iterations={} status={:?} restart={:?} tenure={} screening={:?}",
                    result.number_of_iterations, result.termination_status, restart, state.tabu_tenure, state.screening_mode
                );
            }

            let restart_solution = match restart {
                RestartChoice::Local => incumbent.local_augmented_solution().clone(),
                RestartChoice::Global => incumbent.global_augmented_solution().clone(),
                RestartChoice::Previous => previous_restart_solution.clone(),
            };
            reload_solution(model, &restart_solution);
            previous_restart_solution = restart_solution;

            outer_iteration += 1;
        }

        let elapsed_seconds = start.elapsed().as_secs_f64();
        let termination_reason = if controller_options
            .target_objective
            .is_some_and(|target| incumbent.is_found_feasible_solution() && incumbent.feasible_objective() <= target)
        {
            TerminationReason::ReachedTarget
        } else if incumbent.is_found_feasible_solution() {
            TerminationReason::ExhaustedBudgetWithFeasible
        } else {
            TerminationReason::ExhaustedBudgetWithoutFeasible
        };

        let best_solution = if incumbent.is_found_feasible_solution() {
            incumbent.feasible_solution().clone()
        } else {
            incumbent.global_augmented_solution().clone()
        };
        let named_solution = NamedSolution::capture(model, &best_solution);

        let status = StatusRecord {
            termination_reason,
            last_inner_status,
            outer_iterations: outer_iteration,
            total_inner_iterations,
            elapsed_seconds,
            local_update_count,
            global_update_count,
            feasible_update_count,
        };

        info!(
            "controller done: reason={:?} outer_iterations={outer_iteration} elapsed={elapsed_seconds:.3}s",
            status.termination_reason
        );

        Ok((named_solution, status, archive))
    }
}

/// Replays `solution` onto `model` as one compound move, the same pattern
/// [`NamedSolution::capture`] and the controller's penalty functions use
/// to read a stored assignment back into a live model.
fn reload_solution(model: &mut Model, solution: &Solution) {
    let alterations: Vec<_> = solution
        .values
        .iter()
        .enumerate()
        .filter_map(|(idx, &value)| {
            let vid = crate::model::VariableId(idx as u32);
            (model.value(vid) != value).then_some((vid, value))
        })
        .collect();
    if !alterations.is_empty() {
        model.update(&Move::new(alterations, MoveSense::User, Vec::new()));
    }
}

/// Only archive a run that just produced a *new* feasible incumbent;
/// otherwise every outer iteration would re-insert the same entry.
fn archive_candidate(
    model: &Model,
    incumbent: &IncumbentHolder,
    result: &crate::tabu::TabuSearchResult,
) -> Option<ArchivedSolution> {
    if !result.is_found_new_feasible_solution {
        return None;
    }
    let named = NamedSolution::capture(model, incumbent.feasible_solution());
    Some(ArchivedSolution {
        objective: named.objective,
        total_violation: named.total_violation,
        variable_values: named.variable_values,
    })
}
