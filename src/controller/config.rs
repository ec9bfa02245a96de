//! Controller configuration: the outer-loop half of `spec.md` §6's Options
//! record (the inner half is [`crate::tabu::TabuOptions`]).
//!
//! Every numeric default introduced here that `spec.md` itself leaves
//! unstated is grounded in
//! `original_source/printemps/solver/tabu_search/controller/tabu_search_controller_parameter_manager.h`
//! (`TabuSearchControllerParameterManagerConstant`).

use std::time::Duration;

use crate::error::{SolverError, SolverResult};
use crate::model::ConstraintId;
use crate::neighborhood::{ChainReduceMode, ImprovabilityScreeningMode};

/// How much progress detail a solve prints (`spec.md` §6). Ordered so that
/// `a >= b` means "`a` prints at least everything `b` prints".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbose {
    None,
    Warning,
    Outer,
    Inner,
    Full,
    Debug,
}

/// `spec.md` §4.6 step 5, "local range relative to global < 1%".
pub(crate) const RELATIVE_RANGE_THRESHOLD: f64 = 1e-2;
pub(crate) const PENALTY_RELAXING_RATE_MIN: f64 = 0.3;
pub(crate) const PENALTY_RELAXING_RATE_MAX: f64 = 1.0 - 1e-4;
pub(crate) const PENALTY_RELAXING_RATE_DECREASE_RATE: f64 = 0.9;
pub(crate) const PENALTY_RELAXING_RATE_STEP_SIZE: f64 = 0.1;
/// `spec.md` §4.6 step 6, "persists beyond 30 iterations after relaxation".
pub(crate) const ITERATION_AFTER_RELAXATION_MAX: u32 = 30;
/// `spec.md` §4.6 step 2, "after 2 failures".
pub(crate) const INFEASIBLE_STAGNATION_THRESHOLD: u32 = 2;

/// Knobs the outer controller owns (`spec.md` §4.6, §6). Paired with
/// [`crate::tabu::TabuOptions`] for the knobs the inner core owns.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub outer_iteration_max: usize,
    pub inner_iteration_max: usize,
    pub time_max: Duration,
    pub target_objective: Option<f64>,
    pub seed: Option<u64>,
    pub verbose: Verbose,

    /// Configured default the relaxing rate reverts to once a feasible
    /// incumbent is found (`spec.md` §4.6 step 3).
    pub penalty_relaxing_rate: f64,
    pub penalty_tightening_rate: f64,
    /// `balance` in the tightening formula (`spec.md` §4.6 step 4).
    pub penalty_coefficient_updating_balance: f64,
    pub is_enabled_grouping_penalty_coefficient: bool,
    /// Constraints grouped for `set_grouped_local_penalty`; empty disables
    /// grouping even if `is_enabled_grouping_penalty_coefficient` is set.
    pub constraint_groups: Vec<Vec<ConstraintId>>,

    pub is_enabled_automatic_tabu_tenure_adjustment: bool,
    pub is_enabled_initial_modification: bool,
    pub initial_modification_fixed_rate: f64,
    pub initial_modification_randomize_rate: f64,

    pub is_enabled_automatic_iteration_adjustment: bool,
    pub iteration_increase_rate: f64,
    /// Fraction of the (master) inner iteration budget after which a local
    /// update with no global update triggers early pruning, active only
    /// while the budget equals the master maximum (`spec.md` §4.6 step 9).
    pub pruning_rate_threshold: f64,

    pub is_enabled_chain_move: bool,
    pub chain_move_capacity: usize,
    pub chain_move_reduce_mode: ChainReduceMode,

    /// Screening mode the first (and every non-adaptive) inner run starts
    /// with; `Automatic` hands per-run selection to the controller
    /// (`SPEC_FULL.md` §4.6 `[ADD]`).
    pub improvability_screening_mode: ImprovabilityScreeningMode,

    pub solution_archive_capacity: usize,
    pub is_enabled_solution_archive_dedupe: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            outer_iteration_max: 20,
            inner_iteration_max: 200,
            time_max: Duration::from_secs(120),
            target_objective: None,
            seed: None,
            verbose: Verbose::None,

            penalty_relaxing_rate: 0.5,
            penalty_tightening_rate: 1.0,
            penalty_coefficient_updating_balance: 0.5,
            is_enabled_grouping_penalty_coefficient: false,
            constraint_groups: Vec::new(),

            is_enabled_automatic_tabu_tenure_adjustment: true,
            is_enabled_initial_modification: true,
            initial_modification_fixed_rate: 0.5,
            initial_modification_randomize_rate: 0.5,

            is_enabled_automatic_iteration_adjustment: true,
            iteration_increase_rate: 1.2,
            pruning_rate_threshold: 0.5,

            is_enabled_chain_move: true,
            chain_move_capacity: 32,
            chain_move_reduce_mode: ChainReduceMode::DropHighestOverlap,

            improvability_screening_mode: ImprovabilityScreeningMode::Automatic,

            solution_archive_capacity: 100,
            is_enabled_solution_archive_dedupe: true,
        }
    }
}

impl ControllerOptions {
    pub fn with_outer_iteration_max(mut self, max: usize) -> Self {
        self.outer_iteration_max = max;
        self
    }

    pub fn with_inner_iteration_max(mut self, max: usize) -> Self {
        self.inner_iteration_max = max;
        self
    }

    pub fn with_time_max(mut self, time_max: Duration) -> Self {
        self.time_max = time_max;
        self
    }

    pub fn with_target_objective(mut self, target: Option<f64>) -> Self {
        self.target_objective = target;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_verbose(mut self, verbose: Verbose) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_penalty_relaxing_rate(mut self, rate: f64) -> Self {
        self.penalty_relaxing_rate = rate;
        self
    }

    pub fn with_penalty_tightening_rate(mut self, rate: f64) -> Self {
        self.penalty_tightening_rate = rate;
        self
    }

    pub fn with_penalty_coefficient_updating_balance(mut self, balance: f64) -> Self {
        self.penalty_coefficient_updating_balance = balance;
        self
    }

    pub fn with_grouping_penalty_coefficient(mut self, enabled: bool, groups: Vec<Vec<ConstraintId>>) -> Self {
        self.is_enabled_grouping_penalty_coefficient = enabled;
        self.constraint_groups = groups;
        self
    }

    pub fn with_automatic_tabu_tenure_adjustment(mut self, enabled: bool) -> Self {
        self.is_enabled_automatic_tabu_tenure_adjustment = enabled;
        self
    }

    pub fn with_initial_modification(mut self, enabled: bool, fixed_rate: f64, randomize_rate: f64) -> Self {
        self.is_enabled_initial_modification = enabled;
        self.initial_modification_fixed_rate = fixed_rate;
        self.initial_modification_randomize_rate = randomize_rate;
        self
    }

    pub fn with_automatic_iteration_adjustment(mut self, enabled: bool, increase_rate: f64) -> Self {
        self.is_enabled_automatic_iteration_adjustment = enabled;
        self.iteration_increase_rate = increase_rate;
        self
    }

    pub fn with_pruning_rate_threshold(mut self, threshold: f64) -> Self {
        self.pruning_rate_threshold = threshold;
        self
    }

    pub fn with_chain_move(mut self, enabled: bool, capacity: usize, mode: ChainReduceMode) -> Self {
        self.is_enabled_chain_move = enabled;
        self.chain_move_capacity = capacity;
        self.chain_move_reduce_mode = mode;
        self
    }

    pub fn with_improvability_screening_mode(mut self, mode: ImprovabilityScreeningMode) -> Self {
        self.improvability_screening_mode = mode;
        self
    }

    pub fn with_solution_archive(mut self, capacity: usize, dedupe: bool) -> Self {
        self.solution_archive_capacity = capacity;
        self.is_enabled_solution_archive_dedupe = dedupe;
        self
    }

    pub fn validate(&self) -> SolverResult<()> {
        if self.outer_iteration_max == 0 {
            return Err(SolverError::UserInputError("outer_iteration_max must be >= 1".to_string()));
        }
        if self.inner_iteration_max == 0 {
            return Err(SolverError::UserInputError("inner_iteration_max must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.penalty_relaxing_rate) {
            return Err(SolverError::UserInputError(format!(
                "penalty_relaxing_rate must be in [0, 1], got {}",
                self.penalty_relaxing_rate
            )));
        }
        if self.penalty_tightening_rate < 0.0 {
            return Err(SolverError::UserInputError("penalty_tightening_rate must be non-negative".to_string()));
        }
        if !(0.0..=1.0).contains(&self.penalty_coefficient_updating_balance) {
            return Err(SolverError::UserInputError(
                "penalty_coefficient_updating_balance must be in [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_modification_fixed_rate) {
            return Err(SolverError::UserInputError(
                "initial_modification_fixed_rate must be in [0, 1]".to_string(),
            ));
        }
        if self.iteration_increase_rate < 1.0 {
            return Err(SolverError::UserInputError("iteration_increase_rate must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.pruning_rate_threshold) {
            return Err(SolverError::UserInputError("pruning_rate_threshold must be in [0, 1]".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ControllerOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_outer_iteration_max_is_rejected() {
        let options = ControllerOptions::default().with_outer_iteration_max(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn relaxing_rate_out_of_range_is_rejected() {
        let options = ControllerOptions::default().with_penalty_relaxing_rate(1.5);
        assert!(options.validate().is_err());
    }

    #[test]
    fn verbose_levels_order_as_declared() {
        assert!(Verbose::Debug > Verbose::Full);
        assert!(Verbose::Outer > Verbose::Warning);
        assert!(Verbose::None < Verbose::Warning);
    }
}
