//! Affine (linear) expressions over variables.

use std::collections::HashMap;

use super::variable::{Variable, VariableId};

/// Stable handle into [`crate::model::Model`]'s expression arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(pub u32);

impl ExpressionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// `sum_i coefficient_i * variable_i + constant`.
///
/// Terms are kept in insertion order (mirrors the `flat_indexed` proxy
/// iteration order the original source relies on for deterministic
/// incidence traversal — `SPEC_FULL.md` §3) with a side index for O(1)
/// coefficient lookup during fast evaluation.
#[derive(Debug, Clone)]
pub struct Expression {
    pub(crate) terms: Vec<(VariableId, f64)>,
    term_index: HashMap<VariableId, usize>,
    pub(crate) constant: f64,
    pub(crate) value: f64,
}

impl Expression {
    pub fn new(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            term_index: HashMap::new(),
            constant,
            value: constant,
        }
    }

    /// Adds `coefficient * variable` to the expression. Repeated calls for
    /// the same variable accumulate, matching how the source folds
    /// duplicate terms rather than overwriting them.
    pub fn add_term(&mut self, variable: VariableId, coefficient: f64) -> &mut Self {
        if let Some(&idx) = self.term_index.get(&variable) {
            self.terms[idx].1 += coefficient;
        } else {
            self.term_index.insert(variable, self.terms.len());
            self.terms.push((variable, coefficient));
        }
        self
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn terms(&self) -> &[(VariableId, f64)] {
        &self.terms
    }

    pub fn coefficient(&self, variable: VariableId) -> f64 {
        self.term_index
            .get(&variable)
            .map(|&idx| self.terms[idx].1)
            .unwrap_or(0.0)
    }

    /// Cached value, valid immediately after [`Expression::recompute`] or a
    /// run of [`Expression::apply_delta`] calls.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Full recomputation: sums every stored term against `variables`.
    /// O(terms), used for initial evaluation and consistency audits
    /// (`spec.md` §4.1 "Full" path).
    pub fn recompute(&mut self, variables: &[Variable]) {
        let mut total = self.constant;
        for &(var, coeff) in &self.terms {
            total += coeff * variables[var.index()].value() as f64;
        }
        self.value = total;
    }

    /// Fast incremental update: adds `coefficient(variable) * delta` to the
    /// cached value. O(1). Callers are responsible for only invoking this
    /// for expressions actually incident to `variable` (see
    /// `Model`'s `variable_to_expressions` incidence list).
    pub fn apply_delta(&mut self, variable: VariableId, delta: i64) {
        let coeff = self.coefficient(variable);
        if coeff != 0.0 {
            self.value += coeff * delta as f64;
        }
    }
}
