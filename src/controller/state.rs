//! Outer-iteration bookkeeping and the per-iteration decision tree
//! (`spec.md` §4.6), ported from `original_source/printemps/solver/
//! tabu_search/controller/tabu_search_controller_parameter_manager.h`'s
//! `update()` method.
//!
//! Two pieces of state this file tracks have no retrievable derivation in
//! `original_source` — only their *use* is visible there. Both are
//! resolved here from first principles and recorded in `DESIGN.md`:
//! `dual_intensity` (a penalty-side analogue of `Memory::primal_intensity`)
//! and the `is_infeasible_stagnation` / `iteration_after_*` counters (the
//! defining struct, `TabuSearchControllerState`, was not present in the
//! retrieved corpus).

use rand::Rng;

use crate::constants::EPSILON;
use crate::incumbent::{IncumbentHolder, IncumbentUpdate, Solution};
use crate::model::{ConstraintId, Model, VariableId};
use crate::neighborhood::{ChainReduceMode, ImprovabilityScreeningMode, Move, MoveSense, Neighborhood};
use crate::tabu::{TabuOptions, TabuSearchResult};

use super::config::{
    ControllerOptions, INFEASIBLE_STAGNATION_THRESHOLD, ITERATION_AFTER_RELAXATION_MAX, PENALTY_RELAXING_RATE_DECREASE_RATE,
    PENALTY_RELAXING_RATE_MAX, PENALTY_RELAXING_RATE_MIN, PENALTY_RELAXING_RATE_STEP_SIZE, RELATIVE_RANGE_THRESHOLD,
};

/// Which incumbent a restart reloads the model from (`spec.md` §4.6 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartChoice {
    Local,
    Global,
    Previous,
}

/// The adaptive knobs and counters the outer controller carries across
/// iterations. Everything here is re-derived every outer iteration by
/// [`ControllerState::update`]; nothing is touched by the inner core.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub tabu_tenure: i64,
    pub inner_iteration_max: usize,
    pub pruning_rate_threshold: f64,
    pub number_of_initial_modification: usize,
    pub penalty_relaxing_rate: f64,
    pub screening_mode: ImprovabilityScreeningMode,

    iteration_after_no_update: u32,
    iteration_after_relaxation: u32,
    relaxation_count: u32,
    employing_local_count_after_relaxation: u32,
    employing_global_count_after_relaxation: u32,
    employing_previous_count_after_relaxation: u32,

    previous_primal_intensity: f64,
    previous_dual_intensity: f64,
    primal_intensity_before_relaxation: f64,
    dual_intensity_before_relaxation: f64,

    /// How many times each constraint's local penalty has been tightened,
    /// the dual-side analogue of `Memory::update_count`.
    tighten_counts: Vec<u64>,
    total_tighten_count: u64,
}

impl ControllerState {
    pub fn new(options: &ControllerOptions, tabu_options: &TabuOptions, number_of_constraints: usize) -> Self {
        let screening_mode = match options.improvability_screening_mode {
            // The source's `reset()` seeds Automatic search at its most
            // thorough concrete mode.
            ImprovabilityScreeningMode::Automatic => ImprovabilityScreeningMode::Intensive,
            concrete => concrete,
        };
        Self {
            tabu_tenure: tabu_options.initial_tabu_tenure,
            inner_iteration_max: options.inner_iteration_max,
            pruning_rate_threshold: options.pruning_rate_threshold,
            number_of_initial_modification: 0,
            penalty_relaxing_rate: options.penalty_relaxing_rate,
            screening_mode,
            iteration_after_no_update: 0,
            iteration_after_relaxation: 0,
            relaxation_count: 0,
            employing_local_count_after_relaxation: 0,
            employing_global_count_after_relaxation: 0,
            employing_previous_count_after_relaxation: 0,
            previous_primal_intensity: 0.0,
            previous_dual_intensity: 0.0,
            primal_intensity_before_relaxation: 0.0,
            dual_intensity_before_relaxation: 0.0,
            tighten_counts: vec![0; number_of_constraints],
            total_tighten_count: 0,
        }
    }

    /// `Σ(tighten_count_c / total_tighten_count)²` — the penalty-side
    /// analogue of `Memory::primal_intensity`, tracking how concentrated
    /// tightening has become on a handful of constraints. See module doc.
    pub fn dual_intensity(&self) -> f64 {
        if self.total_tighten_count == 0 {
            return 0.0;
        }
        let total = self.total_tighten_count as f64;
        self.tighten_counts.iter().map(|&c| (c as f64 / total).powi(2)).sum()
    }

    /// "No feasible solution yet, and the search has gone
    /// `INFEASIBLE_STAGNATION_THRESHOLD` outer iterations without *any*
    /// incumbent update" (`spec.md` §4.6 step 2, "after 2 failures").
    fn is_infeasible_stagnation(&self, incumbent: &IncumbentHolder) -> bool {
        !incumbent.is_found_feasible_solution() && self.iteration_after_no_update >= INFEASIBLE_STAGNATION_THRESHOLD
    }

    /// One full outer-iteration decision tree pass: resolves `Automatic`
    /// screening, picks the restart solution, adjusts the penalty
    /// relaxing rate, tightens/relaxes/resets penalties, adapts the tabu
    /// tenure baseline, the initial-modification count, the inner
    /// iteration budget, and the special-neighborhood/chain-pool state.
    /// Returns which solution the caller should reload into `model`
    /// before the next inner run.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        options: &ControllerOptions,
        tabu_options: &TabuOptions,
        model: &mut Model,
        neighborhood: &mut Neighborhood,
        incumbent: &IncumbentHolder,
        result: &TabuSearchResult,
        current_primal_intensity: f64,
        rng: &mut impl Rng,
    ) -> RestartChoice {
        let is_global_updated = result.total_update_status.contains(IncumbentUpdate::GLOBAL);
        let is_local_updated = result.total_update_status.contains(IncumbentUpdate::LOCAL);
        let is_feasible_updated = result.total_update_status.contains(IncumbentUpdate::FEASIBLE);
        let is_not_updated = result.total_update_status.is_empty();

        let current_dual_intensity = self.dual_intensity();
        let infeasible_stagnation = self.is_infeasible_stagnation(incumbent);

        self.screening_mode =
            self.resolve_screening_mode(options, result, is_global_updated, infeasible_stagnation);

        let (restart, mut force_initial_modification, relax, mut tighten) = self.choose_restart(
            is_global_updated,
            is_local_updated,
            is_not_updated,
            incumbent,
            result.global_augmented_objective_range,
        );

        if relax {
            self.update_penalty_relaxing_rate(
                infeasible_stagnation,
                is_feasible_updated,
                current_primal_intensity,
                current_dual_intensity,
                options,
            );
        }

        let mut reset = false;
        if tighten && infeasible_stagnation && self.iteration_after_relaxation > ITERATION_AFTER_RELAXATION_MAX {
            reset = true;
            tighten = false;
            force_initial_modification = true;
        }

        let restart = if reset { RestartChoice::Global } else { restart };

        if reset {
            reset_all_local_penalties(model);
        } else if tighten {
            tighten_local_penalties(model, incumbent, options, &mut self.tighten_counts, &mut self.total_tighten_count);
        } else if relax {
            relax_local_penalties(model, incumbent, result, self.penalty_relaxing_rate);
        }

        if options.is_enabled_automatic_tabu_tenure_adjustment {
            self.update_tabu_tenure(
                tabu_options,
                model,
                is_global_updated,
                is_not_updated,
                result,
                current_primal_intensity,
                current_dual_intensity,
            );
        }

        self.number_of_initial_modification = if options.is_enabled_initial_modification
            && force_initial_modification
            && !is_global_updated
        {
            self.compute_initial_modification(options, rng)
        } else {
            0
        };

        if options.is_enabled_automatic_iteration_adjustment {
            self.update_iteration_budget(options, result, is_global_updated);
        }

        self.update_special_neighborhoods(neighborhood, is_global_updated, result);
        self.update_chain_pool(options, neighborhood, is_global_updated, rng);

        self.advance_counters(is_not_updated, relax || reset, restart, current_primal_intensity, current_dual_intensity);

        restart
    }

    fn resolve_screening_mode(
        &self,
        options: &ControllerOptions,
        result: &TabuSearchResult,
        is_global_updated: bool,
        infeasible_stagnation: bool,
    ) -> ImprovabilityScreeningMode {
        if options.improvability_screening_mode != ImprovabilityScreeningMode::Automatic {
            return options.improvability_screening_mode;
        }
        use crate::tabu::TerminationStatus;
        if result.termination_status == TerminationStatus::NoMove {
            ImprovabilityScreeningMode::Soft
        } else if is_global_updated {
            ImprovabilityScreeningMode::Intensive
        } else if result.is_few_permissible_neighborhood {
            ImprovabilityScreeningMode::Soft
        } else if !result.is_found_new_feasible_solution {
            if infeasible_stagnation {
                if self.relaxation_count % 2 == 0 {
                    ImprovabilityScreeningMode::Intensive
                } else {
                    ImprovabilityScreeningMode::Aggressive
                }
            } else {
                ImprovabilityScreeningMode::Aggressive
            }
        } else {
            ImprovabilityScreeningMode::Soft
        }
    }

    /// Walks the restart-selection table of `spec.md` §4.6 step 2 in
    /// order, first match wins. Returns `(restart, force_initial_mod,
    /// relax, tighten)`.
    fn choose_restart(
        &self,
        is_global_updated: bool,
        is_local_updated: bool,
        is_not_updated: bool,
        incumbent: &IncumbentHolder,
        relative_range: f64,
    ) -> (RestartChoice, bool, bool, bool) {
        if is_global_updated {
            return (RestartChoice::Global, false, true, false);
        }

        if is_not_updated {
            // "inner found nothing": relax if local-feasible (impossible
            // here since LOCAL never fired) or after 2 consecutive
            // failures.
            let relax = self.iteration_after_no_update > 0;
            return (RestartChoice::Global, true, relax, false);
        }

        let local_feasible = local_is_feasible(incumbent);
        let local_finite = incumbent.local_augmented_objective().is_finite();
        let gap = incumbent.global_augmented_objective() - incumbent.local_augmented_objective();

        if local_finite && gap < -EPSILON {
            // local-augmented worse than global.
            let relax = local_feasible;
            return (RestartChoice::Global, true, relax, !relax);
        }

        if local_feasible && gap > EPSILON {
            return (RestartChoice::Local, false, true, false);
        }

        if relative_range < RELATIVE_RANGE_THRESHOLD {
            return (RestartChoice::Global, true, true, false);
        }

        let improved = is_local_updated && self.is_improved(incumbent);
        if improved {
            (RestartChoice::Local, false, false, true)
        } else {
            (RestartChoice::Previous, false, false, true)
        }
    }

    /// "Improved": this run's best-effort local-augmented solution, even
    /// though infeasible, is genuinely ahead of the standing global
    /// incumbent on the raw objective (tie broken by total violation).
    /// See `DESIGN.md` — the source's exact derivation was not retrievable.
    fn is_improved(&self, incumbent: &IncumbentHolder) -> bool {
        let local = incumbent.local_augmented_score();
        let global = incumbent.global_augmented_score();
        if (local.objective - global.objective).abs() > EPSILON {
            local.objective + EPSILON < global.objective
        } else {
            local.total_violation + EPSILON < global.total_violation
        }
    }
}

fn local_is_feasible(incumbent: &IncumbentHolder) -> bool {
    incumbent.local_augmented_objective().is_finite() && incumbent.local_augmented_score().is_feasible
}

fn reset_all_local_penalties(model: &mut Model) {
    for idx in 0..model.constraints().len() {
        model.constraint_mut(ConstraintId(idx as u32)).reset_local_penalty();
    }
}

/// `spec.md` §4.6 step 4: tighten the violated side of every constraint
/// still violated at the local-augmented incumbent, then optionally force
/// the per-group maximum.
fn tighten_local_penalties(
    model: &mut Model,
    incumbent: &IncumbentHolder,
    options: &ControllerOptions,
    tighten_counts: &mut [u64],
    total_tighten_count: &mut u64,
) {
    let violations = constraint_violations_of(model, incumbent.local_augmented_solution());
    let total_violation: f64 = violations.iter().sum();
    if total_violation < EPSILON {
        return;
    }
    let total_violation_sq: f64 = violations.iter().map(|v| v * v).sum();
    let gap = (incumbent.global_augmented_objective() - incumbent.local_augmented_objective()).abs();
    let balance = options.penalty_coefficient_updating_balance;

    for (idx, &violation) in violations.iter().enumerate() {
        if violation < EPSILON {
            continue;
        }
        let constant_share = if total_violation > EPSILON { gap / total_violation } else { 0.0 };
        let proportional_share = if total_violation_sq > EPSILON {
            gap * violation / total_violation_sq
        } else {
            0.0
        };
        let delta = options.penalty_tightening_rate * (balance * constant_share + (1.0 - balance) * proportional_share);
        model.constraint_mut(ConstraintId(idx as u32)).tighten_local_penalty(delta);
        tighten_counts[idx] += 1;
        *total_tighten_count += 1;
    }

    if options.is_enabled_grouping_penalty_coefficient {
        for group in &options.constraint_groups {
            let max_penalty = group
                .iter()
                .map(|&cid| model.constraints()[cid.index()].local_penalty_coefficient())
                .fold(0.0_f64, f64::max);
            for &cid in group {
                model.constraint_mut(cid).set_grouped_local_penalty(max_penalty);
            }
        }
    }
}

/// `spec.md` §4.6 step 5: multiply every satisfied constraint's local
/// penalty by the relaxing rate, capped by the run's objective/constraint
/// ratio when the local-augmented incumbent is feasible.
fn relax_local_penalties(model: &mut Model, incumbent: &IncumbentHolder, result: &TabuSearchResult, relaxing_rate: f64) {
    let mut rate = relaxing_rate;
    if local_is_feasible(incumbent) && result.objective_constraint_rate > EPSILON {
        rate = rate.min(result.objective_constraint_rate);
    }
    let violations = constraint_violations_of(model, incumbent.local_augmented_solution());
    for (idx, &violation) in violations.iter().enumerate() {
        if violation < EPSILON {
            model.constraint_mut(ConstraintId(idx as u32)).relax_local_penalty(rate);
        }
    }
}

/// Replays `solution` onto a clone of `model` (mirrors
/// `NamedSolution::capture`) to read constraint violations at that
/// assignment without disturbing the live model being searched.
fn constraint_violations_of(model: &Model, solution: &Solution) -> Vec<f64> {
    let mut shadow = model.clone();
    let alterations: Vec<(VariableId, i64)> = solution
        .values
        .iter()
        .enumerate()
        .filter_map(|(idx, &value)| {
            let vid = VariableId(idx as u32);
            (shadow.value(vid) != value).then_some((vid, value))
        })
        .collect();
    if !alterations.is_empty() {
        shadow.update(&Move::new(alterations, MoveSense::User, Vec::new()));
    }
    shadow.constraints().iter().map(|c| c.violation()).collect()
}

impl ControllerState {
    #[allow(clippy::too_many_arguments)]
    fn update_penalty_relaxing_rate(
        &mut self,
        infeasible_stagnation: bool,
        is_feasible_updated: bool,
        current_primal_intensity: f64,
        current_dual_intensity: f64,
        options: &ControllerOptions,
    ) {
        self.penalty_relaxing_rate = if infeasible_stagnation
            && current_primal_intensity > self.primal_intensity_before_relaxation + EPSILON
            && current_dual_intensity > self.dual_intensity_before_relaxation + EPSILON
        {
            (self.penalty_relaxing_rate * PENALTY_RELAXING_RATE_DECREASE_RATE).max(PENALTY_RELAXING_RATE_MIN)
        } else if is_feasible_updated {
            options.penalty_relaxing_rate
        } else if self.employing_previous_count_after_relaxation
            > self.employing_local_count_after_relaxation.max(self.employing_global_count_after_relaxation)
        {
            self.penalty_relaxing_rate.sqrt().min(PENALTY_RELAXING_RATE_MAX)
        } else {
            self.penalty_relaxing_rate + PENALTY_RELAXING_RATE_STEP_SIZE * (options.penalty_relaxing_rate - self.penalty_relaxing_rate)
        };
    }

    #[allow(clippy::too_many_arguments)]
    fn update_tabu_tenure(
        &mut self,
        tabu_options: &TabuOptions,
        model: &Model,
        is_global_updated: bool,
        is_not_updated: bool,
        result: &TabuSearchResult,
        current_primal_intensity: f64,
        current_dual_intensity: f64,
    ) {
        let number_of_mutable = (model.number_of_mutable_variables() as i64).max(1);
        let baseline_ceiling = tabu_options.initial_tabu_tenure.min(number_of_mutable);

        if is_global_updated {
            self.tabu_tenure = baseline_ceiling;
        } else if is_not_updated {
            self.tabu_tenure = (self.tabu_tenure - 1).max(baseline_ceiling.min(self.tabu_tenure));
        } else if result.tabu_tenure > self.tabu_tenure {
            self.tabu_tenure = (self.tabu_tenure + 1).min(number_of_mutable);
        } else if result.tabu_tenure == self.tabu_tenure
            && (current_primal_intensity > self.previous_primal_intensity + EPSILON
                || current_dual_intensity > self.previous_dual_intensity + EPSILON)
        {
            // Search is still widening; hold the baseline steady.
        } else {
            self.tabu_tenure = (self.tabu_tenure - 1).max(1);
        }
    }

    fn compute_initial_modification(&self, options: &ControllerOptions, rng: &mut impl Rng) -> usize {
        let base = (options.initial_modification_fixed_rate * self.tabu_tenure as f64).floor() as i64;
        let width = (options.initial_modification_randomize_rate * base as f64).round() as i64;
        let jitter = crate::random::jitter(width, rng);
        (base + jitter).max(1) as usize
    }

    fn update_iteration_budget(&mut self, options: &ControllerOptions, result: &TabuSearchResult, is_global_updated: bool) {
        if result.number_of_iterations >= self.inner_iteration_max {
            let base = if is_global_updated {
                (result.last_global_incumbent_update_iteration.max(1)) as f64
            } else {
                self.inner_iteration_max as f64
            };
            let increased = (base * options.iteration_increase_rate).ceil() as usize;
            self.inner_iteration_max = increased.min(options.inner_iteration_max);
        }
        self.pruning_rate_threshold = if self.inner_iteration_max == options.inner_iteration_max {
            options.pruning_rate_threshold
        } else {
            1.0
        };
    }

    fn update_special_neighborhoods(&mut self, neighborhood: &mut Neighborhood, is_global_updated: bool, result: &TabuSearchResult) {
        if is_global_updated {
            neighborhood.special_enabled = false;
            neighborhood.two_flip_enabled = false;
            neighborhood.chain_enabled = false;
        } else if result.number_of_iterations >= self.inner_iteration_max {
            neighborhood.special_enabled = true;
            neighborhood.two_flip_enabled = true;
            neighborhood.chain_enabled = true;
        }
    }

    fn update_chain_pool(&mut self, options: &ControllerOptions, neighborhood: &mut Neighborhood, is_global_updated: bool, rng: &mut impl Rng) {
        if !options.is_enabled_chain_move {
            neighborhood.clear_chain_pool();
            return;
        }
        if is_global_updated {
            neighborhood.clear_chain_pool();
        }
        neighborhood.maintain_chain_pool(options.chain_move_reduce_mode, rng);
    }

    fn advance_counters(
        &mut self,
        is_not_updated: bool,
        relaxed_or_reset: bool,
        restart: RestartChoice,
        current_primal_intensity: f64,
        current_dual_intensity: f64,
    ) {
        self.iteration_after_no_update = if is_not_updated { self.iteration_after_no_update + 1 } else { 0 };

        if relaxed_or_reset {
            self.iteration_after_relaxation = 0;
            self.relaxation_count += 1;
            self.employing_local_count_after_relaxation = 0;
            self.employing_global_count_after_relaxation = 0;
            self.employing_previous_count_after_relaxation = 0;
            self.primal_intensity_before_relaxation = current_primal_intensity;
            self.dual_intensity_before_relaxation = current_dual_intensity;
        } else {
            self.iteration_after_relaxation += 1;
        }

        match restart {
            RestartChoice::Local => self.employing_local_count_after_relaxation += 1,
            RestartChoice::Global => self.employing_global_count_after_relaxation += 1,
            RestartChoice::Previous => self.employing_previous_count_after_relaxation += 1,
        }

        self.previous_primal_intensity = current_primal_intensity;
        self.previous_dual_intensity = current_dual_intensity;
    }
}
