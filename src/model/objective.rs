//! The linear objective function.

use super::expression::ExpressionId;

/// Optimisation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Sense {
    /// `+1` for minimisation, `-1` for maximisation (`spec.md` §4.1).
    pub fn sign(self) -> f64 {
        match self {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        }
    }
}

/// The single linear objective, expressed as an [`ExpressionId`] plus a
/// direction.
#[derive(Debug, Clone, Copy)]
pub struct Objective {
    pub(crate) expression: ExpressionId,
    pub(crate) sense: Sense,
}

impl Objective {
    pub fn new(expression: ExpressionId, sense: Sense) -> Self {
        Self { expression, sense }
    }

    pub fn expression(&self) -> ExpressionId {
        self.expression
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn sign(&self) -> f64 {
        self.sense.sign()
    }
}
