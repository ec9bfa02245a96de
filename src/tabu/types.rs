//! Supporting types for the Tabu Search Core (`spec.md` §4.5).

use crate::incumbent::IncumbentUpdate;

/// `{permissible?, frequency penalty, Lagrangian penalty}`, computed per
/// candidate move during the parallel batch-evaluation step
/// (`spec.md` §4.5 step 4).
#[derive(Debug, Clone, Copy)]
pub struct MoveScore {
    pub is_permissible: bool,
    pub frequency_penalty: f64,
    /// Always `0.0` here: reserved for a Lagrangian-dual solver's shadow
    /// prices, which this engine does not compute (`spec.md` §1 Non-goals,
    /// "LP relaxation solving"). See `DESIGN.md`.
    pub lagrangian_penalty: f64,
}

/// Why an inner run stopped (`spec.md` §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    TimeOver,
    IterationOver,
    NoMove,
    ReachTarget,
    EarlyStop,
    Optimal,
}

/// Everything the controller needs to know about the run that just
/// finished (`spec.md` §4.5; the three derived statistics are
/// `SPEC_FULL.md` §4.5 additions).
#[derive(Debug, Clone)]
pub struct TabuSearchResult {
    pub total_update_status: IncumbentUpdate,
    pub number_of_iterations: usize,
    pub termination_status: TerminationStatus,
    pub tabu_tenure: i64,
    pub last_local_incumbent_update_iteration: i64,
    pub last_global_incumbent_update_iteration: i64,
    pub last_feasible_incumbent_update_iteration: i64,
    pub is_few_permissible_neighborhood: bool,
    pub is_found_new_feasible_solution: bool,
    /// `max(1, max(|max_obj|,|min_obj|), max_obj-min_obj) /
    /// max(1, min_local_penalty_among_infeasible)`.
    pub objective_constraint_rate: f64,
    /// `max(0, max_global_aug - min_global_aug)` over the run.
    pub global_augmented_objective_range: f64,
    /// `Σ|Δglobal_augmented_objective| / max(1, Σglobal_augmented_objective -
    /// iterations·final_incumbent)`. Exposed for callers who want to log
    /// search efficiency; not consumed by the controller.
    pub performance: f64,
}
