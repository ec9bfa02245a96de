//! The Model: variables, expressions, constraints, and the objective,
//! plus fast incremental evaluation of a trial move (`spec.md` §3, §4.1).
//!
//! Variables, expressions, and constraints live in three arenas owned by
//! `Model`; every cross-reference is a `u32` newtype index
//! (`VariableId`/`ExpressionId`/`ConstraintId`) rather than a pointer,
//! which is what makes it sound to hand out `&Model` to several threads
//! during parallel move evaluation (`spec.md` §5, §9).

mod constraint;
mod expression;
mod objective;
mod score;
mod selection;
mod variable;

pub use constraint::{Constraint, ConstraintId, ConstraintSense};
pub use expression::{Expression, ExpressionId};
pub use objective::{Objective, Sense};
pub use score::SolutionScore;
pub use selection::SelectionGroup;
pub use variable::{Variable, VariableId, VariableSense};

use crate::constants::EPSILON;
use crate::error::{SolverError, SolverResult};
use crate::neighborhood::Move;

/// Owns every Variable, Expression, and Constraint in the reduced model,
/// plus precomputed incidence lists used to keep fast evaluation
/// proportional to incidence count rather than model size
/// (`SPEC_FULL.md` §3, mirroring the source's `ValueProxy` +
/// dependent-expression map).
#[derive(Debug, Clone)]
pub struct Model {
    variables: Vec<Variable>,
    expressions: Vec<Expression>,
    constraints: Vec<Constraint>,
    objective: Objective,
    selection_groups: Vec<SelectionGroup>,
    two_flip_pairs: Vec<(VariableId, VariableId)>,
    variable_to_expressions: Vec<Vec<ExpressionId>>,
    expression_to_constraint: Vec<Option<ConstraintId>>,
    max_abs_objective_sensitivity: f64,
    is_enabled_fast_evaluation: bool,
    is_built: bool,
}

impl Model {
    /// Starts an empty model. Populate it with `add_variable`/
    /// `add_expression`/`add_constraint`/`set_objective`, then call
    /// `build()` once before solving.
    pub fn new(objective_expression: ExpressionId, sense: Sense) -> Self {
        Self {
            variables: Vec::new(),
            expressions: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::new(objective_expression, sense),
            selection_groups: Vec::new(),
            two_flip_pairs: Vec::new(),
            variable_to_expressions: Vec::new(),
            expression_to_constraint: Vec::new(),
            max_abs_objective_sensitivity: 0.0,
            is_enabled_fast_evaluation: true,
            is_built: false,
        }
    }

    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(variable);
        self.variable_to_expressions.push(Vec::new());
        id
    }

    pub fn add_expression(&mut self, expression: Expression) -> ExpressionId {
        let id = ExpressionId(self.expressions.len() as u32);
        self.expressions.push(expression);
        self.expression_to_constraint.push(None);
        id
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstraintId {
        let id = ConstraintId(self.constraints.len() as u32);
        self.expression_to_constraint[constraint.expression().index()] = Some(id);
        self.constraints.push(constraint);
        id
    }

    pub fn add_selection_group(&mut self, members: Vec<VariableId>) {
        for &member in &members {
            self.variables[member.index()].sense = VariableSense::SelectionMember;
        }
        self.selection_groups.push(SelectionGroup::new(members));
    }

    pub fn add_two_flip_pair(&mut self, a: VariableId, b: VariableId) {
        self.two_flip_pairs.push((a, b));
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> &mut Constraint {
        &mut self.constraints[id.index()]
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn selection_groups(&self) -> &[SelectionGroup] {
        &self.selection_groups
    }

    pub fn two_flip_pairs(&self) -> &[(VariableId, VariableId)] {
        &self.two_flip_pairs
    }

    pub fn value(&self, variable: VariableId) -> i64 {
        self.variables[variable.index()].value()
    }

    pub fn is_enabled_fast_evaluation(&self) -> bool {
        self.is_enabled_fast_evaluation
    }

    pub fn set_enabled_fast_evaluation(&mut self, enabled: bool) {
        self.is_enabled_fast_evaluation = enabled;
    }

    pub fn number_of_mutable_variables(&self) -> usize {
        self.variables.iter().filter(|v| !v.is_fixed()).count()
    }

    pub fn max_abs_objective_sensitivity(&self) -> f64 {
        self.max_abs_objective_sensitivity
    }

    /// Finalises the arena: derives incidence lists, caches the objective's
    /// maximum absolute coefficient, runs the first full evaluation, and
    /// seeds every variable's improvability flags. Must be called exactly
    /// once before the model is handed to a [`crate::tabu::TabuSearchCore`].
    pub fn build(&mut self) -> SolverResult<()> {
        for variable in &self.variables {
            if variable.lower_bound() > variable.upper_bound() {
                return Err(SolverError::UserInputError(format!(
                    "variable '{}' has lower bound {} greater than upper bound {}",
                    variable.name(),
                    variable.lower_bound(),
                    variable.upper_bound()
                )));
            }
        }

        for (eid, expression) in self.expressions.iter().enumerate() {
            let eid = ExpressionId(eid as u32);
            for &(variable, _) in expression.terms() {
                let incident = &mut self.variable_to_expressions[variable.index()];
                if !incident.contains(&eid) {
                    incident.push(eid);
                }
            }
        }

        let objective_expression = &self.expressions[self.objective.expression().index()];
        self.max_abs_objective_sensitivity = objective_expression
            .terms()
            .iter()
            .map(|&(_, coeff)| coeff.abs())
            .fold(0.0_f64, f64::max);

        self.evaluate_full();

        for idx in 0..self.variables.len() {
            self.refresh_variable_improvability(VariableId(idx as u32));
        }

        self.is_built = true;
        Ok(())
    }

    /// Full recomputation of every expression and constraint from the
    /// current variable values, then returns the resulting
    /// [`SolutionScore`]. Used to seed a run and by [`Model::audit`]
    /// (`spec.md` §4.1, "Full" path).
    pub fn evaluate_full(&mut self) -> SolutionScore {
        for expression in &mut self.expressions {
            expression.recompute(&self.variables);
        }
        for (eid, maybe_constraint) in self.expression_to_constraint.iter().enumerate() {
            if let Some(cid) = maybe_constraint {
                let value = self.expressions[eid].value();
                self.constraints[cid.index()].recompute_violation(value);
            }
        }
        self.current_score()
    }

    /// Builds a [`SolutionScore`] from the currently cached expression and
    /// constraint values, without recomputing anything.
    pub fn current_score(&self) -> SolutionScore {
        let sign = self.objective.sign();
        let objective_value = self.expressions[self.objective.expression().index()].value();
        let mut total_violation = 0.0;
        let mut local_penalty = 0.0;
        let mut global_penalty = 0.0;
        for constraint in &self.constraints {
            total_violation += constraint.violation();
            local_penalty += constraint.local_penalty_coefficient() * constraint.violation();
            global_penalty += constraint.global_penalty_coefficient() * constraint.violation();
        }
        let mut score = SolutionScore::new(sign, objective_value, 0.0, total_violation, local_penalty, global_penalty);
        score.is_objective_improvable = self.variables.iter().any(|v| v.is_objective_improvable());
        score.is_feasibility_improvable = self.variables.iter().any(|v| v.is_feasibility_improvable());
        score
    }

    /// Evaluates `mv` against the current assignment without mutating the
    /// model: the fast path of `spec.md` §4.1, touching only the
    /// expressions incident to altered variables.
    pub fn evaluate(&self, mv: &Move) -> SolutionScore {
        let sign = self.objective.sign();
        let objective_expression_id = self.objective.expression();

        let mut touched: Vec<(ExpressionId, f64)> = Vec::new();
        for &(var, new_value) in &mv.alterations {
            let delta = new_value - self.variables[var.index()].value();
            if delta == 0 {
                continue;
            }
            for &eid in &self.variable_to_expressions[var.index()] {
                let coeff = self.expressions[eid.index()].coefficient(var);
                if coeff == 0.0 {
                    continue;
                }
                match touched.iter_mut().find(|(id, _)| *id == eid) {
                    Some((_, value)) => *value += coeff * delta as f64,
                    None => touched.push((eid, self.expressions[eid.index()].value() + coeff * delta as f64)),
                }
            }
        }

        let old_objective_value = self.expressions[objective_expression_id.index()].value();
        let new_objective_value = touched
            .iter()
            .find(|(id, _)| *id == objective_expression_id)
            .map(|&(_, value)| value)
            .unwrap_or(old_objective_value);
        let objective_improvement = sign * (old_objective_value - new_objective_value);

        let mut total_violation = 0.0;
        let mut local_penalty = 0.0;
        let mut global_penalty = 0.0;
        for constraint in &self.constraints {
            let violation = touched
                .iter()
                .find(|(id, _)| *id == constraint.expression())
                .map(|&(_, value)| constraint.sense().violation_of(value))
                .unwrap_or_else(|| constraint.violation());
            total_violation += violation;
            local_penalty += constraint.local_penalty_coefficient() * violation;
            global_penalty += constraint.global_penalty_coefficient() * violation;
        }

        SolutionScore::new(
            sign,
            new_objective_value,
            objective_improvement,
            total_violation,
            local_penalty,
            global_penalty,
        )
    }

    /// Applies `mv` permanently: mutates variable values, propagates the
    /// change to every incident expression, recomputes the constraints
    /// those expressions feed, and refreshes improvability flags for the
    /// variables the move touched (`spec.md` §4.1, §3 Move invariant).
    pub fn update(&mut self, mv: &Move) {
        let mut touched_expressions: Vec<ExpressionId> = Vec::new();
        for &(var, new_value) in &mv.alterations {
            let delta = new_value - self.variables[var.index()].value();
            if delta == 0 {
                continue;
            }
            self.variables[var.index()].set_value(new_value);
            let incident = self.variable_to_expressions[var.index()].clone();
            for eid in incident {
                self.expressions[eid.index()].apply_delta(var, delta);
                if !touched_expressions.contains(&eid) {
                    touched_expressions.push(eid);
                }
            }
        }
        for eid in &touched_expressions {
            if let Some(cid) = self.expression_to_constraint[eid.index()] {
                let value = self.expressions[eid.index()].value();
                self.constraints[cid.index()].recompute_violation(value);
            }
        }
        self.refresh_improvability_flags(mv);
    }

    /// Recomputes every expression and constraint from scratch and
    /// compares the result against the incrementally maintained cache.
    /// Used by integration tests and by callers who want an occasional
    /// consistency check on long runs (Testable Property 5); not on the
    /// hot path.
    pub fn audit(&self) -> SolverResult<()> {
        let mut shadow = self.clone();
        shadow.evaluate_full();
        for (lhs, rhs) in self.expressions.iter().zip(shadow.expressions.iter()) {
            if (lhs.value() - rhs.value()).abs() > EPSILON {
                return Err(SolverError::InvariantViolation(format!(
                    "expression cache diverged: fast={} full={}",
                    lhs.value(),
                    rhs.value()
                )));
            }
        }
        for (lhs, rhs) in self.constraints.iter().zip(shadow.constraints.iter()) {
            if (lhs.violation() - rhs.violation()).abs() > EPSILON {
                return Err(SolverError::InvariantViolation(format!(
                    "constraint '{}' violation diverged: fast={} full={}",
                    lhs.name(),
                    lhs.violation(),
                    rhs.violation()
                )));
            }
        }
        Ok(())
    }

    fn refresh_improvability_flags(&mut self, mv: &Move) {
        let mut candidates: Vec<VariableId> = mv.alterations.iter().map(|&(v, _)| v).collect();
        for &cid in &mv.related_constraints {
            let eid = self.constraints[cid.index()].expression();
            for &(var, _) in self.expressions[eid.index()].terms() {
                candidates.push(var);
            }
        }
        candidates.sort();
        candidates.dedup();
        for var_id in candidates {
            self.refresh_variable_improvability(var_id);
        }
    }

    /// Recomputes `is_objective_improvable`/`is_feasibility_improvable` for
    /// a single variable from its bounds, objective coefficient, and the
    /// violation state of its incident constraints (`spec.md` §4.1).
    fn refresh_variable_improvability(&mut self, var_id: VariableId) {
        if self.variables[var_id.index()].is_fixed() {
            let variable = &mut self.variables[var_id.index()];
            variable.is_objective_improvable = false;
            variable.is_feasibility_improvable = false;
            return;
        }

        let sign = self.objective.sign();
        let value = self.variables[var_id.index()].value();
        let lower = self.variables[var_id.index()].lower_bound();
        let upper = self.variables[var_id.index()].upper_bound();
        let can_increase = value < upper;
        let can_decrease = value > lower;

        let objective_expression = self.objective.expression();
        let obj_coeff = self.expressions[objective_expression.index()].coefficient(var_id);
        let objective_improvable =
            (can_increase && sign * obj_coeff < 0.0) || (can_decrease && sign * obj_coeff > 0.0);

        let mut feasibility_improvable = false;
        for &eid in &self.variable_to_expressions[var_id.index()] {
            let Some(cid) = self.expression_to_constraint[eid.index()] else {
                continue;
            };
            let constraint = &self.constraints[cid.index()];
            if constraint.violation() <= EPSILON {
                continue;
            }
            let coeff = self.expressions[eid.index()].coefficient(var_id);
            if coeff == 0.0 {
                continue;
            }
            let expression_value = self.expressions[eid.index()].value();
            let reduces = match constraint.sense() {
                ConstraintSense::LessEqual => (coeff < 0.0 && can_increase) || (coeff > 0.0 && can_decrease),
                ConstraintSense::GreaterEqual => (coeff > 0.0 && can_increase) || (coeff < 0.0 && can_decrease),
                ConstraintSense::Equal => {
                    if expression_value > 0.0 {
                        (coeff < 0.0 && can_increase) || (coeff > 0.0 && can_decrease)
                    } else {
                        (coeff > 0.0 && can_increase) || (coeff < 0.0 && can_decrease)
                    }
                }
            };
            if reduces {
                feasibility_improvable = true;
                break;
            }
        }

        let variable = &mut self.variables[var_id.index()];
        variable.is_objective_improvable = objective_improvable;
        variable.is_feasibility_improvable = feasibility_improvable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighborhood::MoveSense;

    fn single_variable_model() -> Model {
        let mut model = Model::new(ExpressionId(0), Sense::Minimize);
        let x = model.add_variable(Variable::binary("x", 0));
        let mut objective_expr = Expression::new(0.0);
        objective_expr.add_term(x, 1.0);
        model.add_expression(objective_expr);

        let mut constraint_expr = Expression::new(-1.0);
        constraint_expr.add_term(x, 1.0);
        let constraint_expr_id = model.add_expression(constraint_expr);
        model.add_constraint(Constraint::new(
            "x >= 1",
            constraint_expr_id,
            ConstraintSense::GreaterEqual,
            1.0e6,
        ));
        model.build().unwrap();
        model
    }

    #[test]
    fn initial_state_is_infeasible() {
        let model = single_variable_model();
        let score = model.current_score();
        assert!(!score.is_feasible);
        assert_eq!(score.total_violation, 1.0);
    }

    #[test]
    fn flipping_x_to_one_reaches_feasibility() {
        let mut model = single_variable_model();
        let x = VariableId(0);
        let mv = Move::new(vec![(x, 1)], MoveSense::BinaryFlip, vec![ConstraintId(0)]);
        let score = model.evaluate(&mv);
        assert!(score.is_feasible);
        assert_eq!(score.objective, 1.0);

        model.update(&mv);
        assert_eq!(model.value(x), 1);
        model.audit().unwrap();
    }

    #[test]
    fn evaluate_does_not_mutate() {
        let model = single_variable_model();
        let x = VariableId(0);
        let mv = Move::new(vec![(x, 1)], MoveSense::BinaryFlip, vec![ConstraintId(0)]);
        let _ = model.evaluate(&mv);
        assert_eq!(model.value(x), 0);
    }
}
