//! [`SolutionScore`], produced by evaluating a candidate move or the
//! current assignment.

use crate::constants::EPSILON;

/// A fixed record of how good an assignment is, both raw and
/// penalty-augmented (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionScore {
    pub objective: f64,
    pub objective_improvement: f64,
    pub total_violation: f64,
    pub local_penalty: f64,
    pub global_penalty: f64,
    pub local_augmented_objective: f64,
    pub global_augmented_objective: f64,
    pub is_feasible: bool,
    pub is_objective_improvable: bool,
    pub is_feasibility_improvable: bool,
}

impl SolutionScore {
    /// Builds a score from the raw ingredients; derives the augmented
    /// objectives and the feasibility flag (`spec.md` §4.1).
    pub fn new(sign: f64, objective: f64, objective_improvement: f64, total_violation: f64, local_penalty: f64, global_penalty: f64) -> Self {
        Self {
            objective,
            objective_improvement,
            total_violation,
            local_penalty,
            global_penalty,
            local_augmented_objective: sign * objective + local_penalty,
            global_augmented_objective: sign * objective + global_penalty,
            is_feasible: total_violation < EPSILON,
            is_objective_improvable: false,
            is_feasibility_improvable: false,
        }
    }
}

impl Default for SolutionScore {
    fn default() -> Self {
        Self {
            objective: 0.0,
            objective_improvement: 0.0,
            total_violation: 0.0,
            local_penalty: 0.0,
            global_penalty: 0.0,
            local_augmented_objective: 0.0,
            global_augmented_objective: 0.0,
            is_feasible: true,
            is_objective_improvable: false,
            is_feasibility_improvable: false,
        }
    }
}
