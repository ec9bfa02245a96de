//! The [`IncumbentHolder`]: three best-so-far solutions tracked across the
//! whole solve (`spec.md` §3, §4.4).

use crate::constants::EPSILON;
use crate::model::{Model, SolutionScore};

/// A snapshot of every variable's value, cheap to clone and cheap to
/// re-apply to a `Model` (`spec.md` §3 "SolutionArchive", `DenseSolution` in
/// `original_source/printemps/solution/dense_solution.h`).
#[derive(Debug, Clone, Default)]
pub struct Solution {
    pub values: Vec<i64>,
}

impl Solution {
    pub fn capture(model: &Model) -> Self {
        Self {
            values: model.variables().iter().map(|v| v.value()).collect(),
        }
    }
}

/// Which incumbent slots a call to [`IncumbentHolder::try_update`] improved,
/// as a small hand-rolled bitmask (`spec.md` §4.4; mirrors
/// `IncumbentHolderConstant::STATUS_*` in `original_source`'s
/// `incumbent_holder.h` rather than pulling in a bitflags crate for three
/// bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IncumbentUpdate(u8);

impl IncumbentUpdate {
    pub const LOCAL: Self = Self(0b001);
    pub const GLOBAL: Self = Self(0b010);
    pub const FEASIBLE: Self = Self(0b100);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for IncumbentUpdate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for IncumbentUpdate {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Tracks the three incumbents described in `spec.md` §3: the
/// local-augmented incumbent (reset every inner run), the global-augmented
/// incumbent (never reset), and the best feasible solution found so far.
/// Once `feasible` is set it is never unset (`spec.md` §4.4 invariant).
#[derive(Debug, Clone)]
pub struct IncumbentHolder {
    is_found_feasible_solution: bool,
    local_augmented_solution: Solution,
    local_augmented_score: SolutionScore,
    local_augmented_objective: f64,
    global_augmented_solution: Solution,
    global_augmented_score: SolutionScore,
    global_augmented_objective: f64,
    feasible_solution: Solution,
    feasible_score: SolutionScore,
    feasible_objective: f64,
}

impl Default for IncumbentHolder {
    fn default() -> Self {
        Self {
            is_found_feasible_solution: false,
            local_augmented_solution: Solution::default(),
            local_augmented_score: SolutionScore::default(),
            local_augmented_objective: f64::INFINITY,
            global_augmented_solution: Solution::default(),
            global_augmented_score: SolutionScore::default(),
            global_augmented_objective: f64::INFINITY,
            feasible_solution: Solution::default(),
            feasible_score: SolutionScore::default(),
            feasible_objective: f64::INFINITY,
        }
    }
}

impl IncumbentHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each of the three slots may improve independently; improvement is
    /// strict beyond `EPSILON` (`spec.md` §4.4).
    pub fn try_update(&mut self, model: &Model, score: SolutionScore) -> IncumbentUpdate {
        let mut status = IncumbentUpdate::empty();
        let mut solution: Option<Solution> = None;

        if score.local_augmented_objective + EPSILON < self.local_augmented_objective {
            status |= IncumbentUpdate::LOCAL;
            let captured = solution.get_or_insert_with(|| Solution::capture(model)).clone();
            self.local_augmented_solution = captured;
            self.local_augmented_score = score;
            self.local_augmented_objective = score.local_augmented_objective;
        }

        if score.global_augmented_objective + EPSILON < self.global_augmented_objective {
            status |= IncumbentUpdate::GLOBAL;
            let captured = solution.get_or_insert_with(|| Solution::capture(model)).clone();
            self.global_augmented_solution = captured;
            self.global_augmented_score = score;
            self.global_augmented_objective = score.global_augmented_objective;
        }

        if score.is_feasible {
            self.is_found_feasible_solution = true;
            if score.objective + EPSILON < self.feasible_objective {
                status |= IncumbentUpdate::FEASIBLE;
                let captured = solution.get_or_insert_with(|| Solution::capture(model)).clone();
                self.feasible_solution = captured;
                self.feasible_score = score;
                self.feasible_objective = score.objective;
            }
        }

        status
    }

    /// Clears only the local-augmented slot; called at the start of every
    /// inner run (`spec.md` §4.4).
    pub fn reset_local_augmented(&mut self) {
        self.local_augmented_objective = f64::INFINITY;
        self.local_augmented_score = SolutionScore::default();
        self.local_augmented_solution = Solution::default();
    }

    pub fn is_found_feasible_solution(&self) -> bool {
        self.is_found_feasible_solution
    }

    pub fn local_augmented_solution(&self) -> &Solution {
        &self.local_augmented_solution
    }

    pub fn global_augmented_solution(&self) -> &Solution {
        &self.global_augmented_solution
    }

    pub fn feasible_solution(&self) -> &Solution {
        &self.feasible_solution
    }

    pub fn local_augmented_objective(&self) -> f64 {
        self.local_augmented_objective
    }

    pub fn global_augmented_objective(&self) -> f64 {
        self.global_augmented_objective
    }

    pub fn feasible_objective(&self) -> f64 {
        self.feasible_objective
    }

    pub fn local_augmented_score(&self) -> SolutionScore {
        self.local_augmented_score
    }

    pub fn global_augmented_score(&self) -> SolutionScore {
        self.global_augmented_score
    }

    pub fn feasible_score(&self) -> SolutionScore {
        self.feasible_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, ConstraintSense, Expression, ExpressionId, Sense, Variable};

    fn model_with_binary(initial: i64) -> Model {
        let mut model = Model::new(ExpressionId(0), Sense::Minimize);
        let x = model.add_variable(Variable::binary("x", initial));
        let mut obj = Expression::new(0.0);
        obj.add_term(x, 1.0);
        model.add_expression(obj);
        let mut constraint_expr = Expression::new(-1.0);
        constraint_expr.add_term(x, 1.0);
        let cid = model.add_expression(constraint_expr);
        model.add_constraint(Constraint::new("x>=1", cid, ConstraintSense::GreaterEqual, 10.0));
        model.build().unwrap();
        model
    }

    #[test]
    fn default_slots_start_at_infinity() {
        let holder = IncumbentHolder::new();
        assert_eq!(holder.local_augmented_objective(), f64::INFINITY);
        assert_eq!(holder.global_augmented_objective(), f64::INFINITY);
        assert_eq!(holder.feasible_objective(), f64::INFINITY);
        assert!(!holder.is_found_feasible_solution());
    }

    #[test]
    fn feasible_slot_never_unsets() {
        let model = model_with_binary(1);
        let mut holder = IncumbentHolder::new();
        let score = model.current_score();
        let status = holder.try_update(&model, score);
        assert!(status.contains(IncumbentUpdate::FEASIBLE));
        assert!(holder.is_found_feasible_solution());

        // A strictly worse infeasible score cannot unset the feasible flag.
        let worse = model.current_score();
        holder.try_update(&model, worse);
        assert!(holder.is_found_feasible_solution());
    }

    #[test]
    fn reset_local_augmented_keeps_global_and_feasible() {
        let model = model_with_binary(1);
        let mut holder = IncumbentHolder::new();
        holder.try_update(&model, model.current_score());
        holder.reset_local_augmented();

        assert_eq!(holder.local_augmented_objective(), f64::INFINITY);
        assert!(holder.global_augmented_objective().is_finite());
        assert!(holder.feasible_objective().is_finite());
    }

    #[test]
    fn improvement_must_be_strict() {
        let model = model_with_binary(1);
        let mut holder = IncumbentHolder::new();
        let score = model.current_score();
        holder.try_update(&model, score);
        let status = holder.try_update(&model, score);
        assert!(status.is_empty());
    }
}
