//! [`Move`] and its sense tag.

use crate::model::{ConstraintId, VariableId};

/// What produced a [`Move`]; also governs how it participates in chain
/// registration and the `L2` special-move penalty (`spec.md` §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSense {
    BinaryFlip,
    IntegerStep,
    Selection,
    Aggregation,
    Precedence,
    VariableBound,
    TwoFlip,
    Chain,
    User,
}

impl MoveSense {
    /// Aggregation/precedence/variable-bound/two-flip/chain moves are
    /// "special": they may be disabled by the controller and are penalised
    /// by `L2` if they improve neither objective nor feasibility
    /// (`spec.md` §4.5 step 5, §4.2).
    pub fn is_special(self) -> bool {
        !matches!(self, MoveSense::BinaryFlip | MoveSense::IntegerStep | MoveSense::Selection)
    }

    /// Binary-valued moves are eligible to seed or extend a chain
    /// (`spec.md` §4.2, "Chain"): flips, prior chains, and two-flips.
    pub fn is_chain_compatible(self) -> bool {
        matches!(self, MoveSense::BinaryFlip | MoveSense::Chain | MoveSense::TwoFlip)
    }
}

/// An ordered list of `(variable, new_value)` alterations applied
/// atomically, plus the metadata move evaluation and chain registration
/// need (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct Move {
    pub alterations: Vec<(VariableId, i64)>,
    pub sense: MoveSense,
    pub related_constraints: Vec<ConstraintId>,
    pub is_special: bool,
    pub is_available: bool,
    /// Chain moves only; fraction of touched constraints shared between the
    /// two moves concatenated to form this chain. See `DESIGN.md` for the
    /// definition adopted (the original neighborhood.h computing this was
    /// not retained in the reference corpus). Deliberately *not* a ratio
    /// over altered variables: a chain with duplicate variables is already
    /// rejected outright (`has_duplicate_variables`), so a variable-Jaccard
    /// overlap would be zero for every chain that survives that gate.
    pub overlap_rate: f64,
}

impl Move {
    pub fn new(alterations: Vec<(VariableId, i64)>, sense: MoveSense, related_constraints: Vec<ConstraintId>) -> Self {
        let is_special = sense.is_special();
        Self {
            alterations,
            sense,
            related_constraints,
            is_special,
            is_available: true,
            overlap_rate: 0.0,
        }
    }

    pub fn is_univariate(&self) -> bool {
        self.alterations.len() == 1
    }

    /// Touches any variable marked `is_objective_improvable` or
    /// `is_feasibility_improvable`, per the flag lookups the neighborhood's
    /// accept-flag filter needs (`spec.md` §4.2).
    pub fn touches_any(&self, flags: &[bool]) -> bool {
        self.alterations.iter().any(|&(v, _)| flags[v.index()])
    }

    /// Componentwise complement used when registering a chain in both
    /// directions (`spec.md` §4.2, "Chains are registered in both
    /// directions"). Only meaningful for binary alterations: each new
    /// value `v` becomes `1 - v`.
    pub fn complement(&self) -> Move {
        let alterations = self.alterations.iter().map(|&(v, val)| (v, 1 - val)).collect();
        Move {
            alterations,
            sense: self.sense,
            related_constraints: self.related_constraints.clone(),
            is_special: self.is_special,
            is_available: true,
            overlap_rate: self.overlap_rate,
        }
    }

    /// Concatenates `self` (the earlier move) with `next` to form a chain
    /// candidate. Caller is responsible for the compatibility and
    /// no-duplicate-variable gates (`spec.md` §4.2, §4.5 step 8).
    pub fn chain_with(&self, next: &Move) -> Move {
        let mut alterations = self.alterations.clone();
        alterations.extend_from_slice(&next.alterations);

        let shared = self
            .related_constraints
            .iter()
            .filter(|c| next.related_constraints.contains(c))
            .count();
        let union = self.related_constraints.len() + next.related_constraints.len() - shared;
        let overlap_rate = if union == 0 { 0.0 } else { shared as f64 / union as f64 };

        let mut related_constraints = self.related_constraints.clone();
        related_constraints.extend_from_slice(&next.related_constraints);
        related_constraints.sort_by_key(|c| c.0);
        related_constraints.dedup();

        Move {
            alterations,
            sense: MoveSense::Chain,
            related_constraints,
            is_special: true,
            is_available: true,
            overlap_rate,
        }
    }

    /// No variable is altered by both a move and itself via duplicate
    /// entries (`spec.md` §4.2, "Chains ... with duplicate variables are
    /// discarded").
    pub fn has_duplicate_variables(&self) -> bool {
        let mut seen: Vec<VariableId> = self.alterations.iter().map(|&(v, _)| v).collect();
        seen.sort();
        let before = seen.len();
        seen.dedup();
        seen.len() != before
    }
}
