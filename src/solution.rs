//! Output types returned to the caller once a solve finishes
//! (`spec.md` §6 "Outputs").

use crate::incumbent::Solution;
use crate::model::{Model, VariableId};
use crate::neighborhood::{Move, MoveSense};
use crate::tabu::TerminationStatus;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The best incumbent the engine found, expanded back into named variables,
/// expressions, and constraints for a caller that no longer has the
/// `Model`'s index handles (`spec.md` §6, "NamedSolution").
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NamedSolution {
    pub variable_values: Vec<(String, i64)>,
    pub expression_values: Vec<f64>,
    pub constraint_values: Vec<(String, f64)>,
    pub violations: Vec<(String, f64)>,
    pub objective: f64,
    pub total_violation: f64,
    pub is_feasible: bool,
}

impl NamedSolution {
    /// Expands `solution` (a dense array of variable values keyed by
    /// `VariableId`) into the named form, by replaying it through a clone of
    /// `model` as a single compound move.
    pub fn capture(model: &Model, solution: &Solution) -> Self {
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
        let score = shadow.current_score();

        let variable_values = shadow
            .variables()
            .iter()
            .map(|v| (v.name().to_string(), v.value()))
            .collect();
        let expression_values = shadow.expressions().iter().map(|e| e.value()).collect();
        let constraint_values = shadow
            .constraints()
            .iter()
            .map(|c| (c.name().to_string(), shadow.expressions()[c.expression().index()].value()))
            .collect();
        let violations = shadow.constraints().iter().map(|c| (c.name().to_string(), c.violation())).collect();

        Self {
            variable_values,
            expression_values,
            constraint_values,
            violations,
            objective: score.objective,
            total_violation: score.total_violation,
            is_feasible: score.is_feasible,
        }
    }
}

/// Summary of a whole solve: why it stopped, how much work it did, and the
/// incumbent-update counters the caller might want to log
/// (`spec.md` §6, "Status record").
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusRecord {
    pub termination_reason: TerminationReason,
    pub last_inner_status: TerminationStatus,
    pub outer_iterations: usize,
    pub total_inner_iterations: usize,
    pub elapsed_seconds: f64,
    pub local_update_count: usize,
    pub global_update_count: usize,
    pub feasible_update_count: usize,
}

/// `spec.md` §7, "the status record always carries a termination reason; the
/// caller distinguishes...".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationReason {
    /// A feasible solution at or below the target objective was found.
    ReachedTarget,
    /// The time or iteration budget was exhausted with a feasible incumbent
    /// in hand.
    ExhaustedBudgetWithFeasible,
    /// The time or iteration budget was exhausted without ever finding a
    /// feasible solution.
    ExhaustedBudgetWithoutFeasible,
}

/// A bounded, optionally deduplicated log of feasible sparse solutions
/// produced during the run, serialisable as the "SolutionArchive JSON"
/// output (`spec.md` §3 "SolutionArchive (optional)", §6).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolutionArchive {
    entries: Vec<ArchivedSolution>,
    capacity: usize,
    dedupe: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArchivedSolution {
    pub objective: f64,
    pub total_violation: f64,
    pub variable_values: Vec<(String, i64)>,
}

impl SolutionArchive {
    pub fn new(capacity: usize, dedupe: bool) -> Self {
        Self { entries: Vec::new(), capacity, dedupe }
    }

    pub fn entries(&self) -> &[ArchivedSolution] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Appends a feasible solution, trimming to `capacity` by dropping the
    /// worst-objective entry (optionally skipping exact duplicates first).
    pub fn push(&mut self, entry: ArchivedSolution) {
        if self.capacity == 0 {
            return;
        }
        if self.dedupe && self.entries.iter().any(|e| e.variable_values == entry.variable_values) {
            return;
        }
        self.entries.push(entry);
        if self.entries.len() > self.capacity {
            self.entries.sort_by(|a, b| a.objective.total_cmp(&b.objective));
            self.entries.truncate(self.capacity);
        }
    }
}
