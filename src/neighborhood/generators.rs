//! Move generators. Each one inspects the [`Model`] and proposes candidate
//! [`Move`]s; `Neighborhood::update_moves` fans out to whichever of these
//! are currently enabled (`spec.md` §4.2).

use std::collections::HashSet;

use crate::model::{ConstraintId, ConstraintSense, Model, VariableSense};

use super::types::{Move, MoveSense};

/// One single-variable flip per mutable binary variable.
pub fn binary_flip(model: &Model) -> Vec<Move> {
    model
        .variables()
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_fixed() && matches!(v.sense(), VariableSense::Binary))
        .map(|(idx, v)| {
            let id = crate::model::VariableId(idx as u32);
            Move::new(vec![(id, 1 - v.value())], MoveSense::BinaryFlip, Vec::new())
        })
        .collect()
}

/// `+1`/`-1` single-variable steps per mutable general-integer variable,
/// clipped to bounds.
pub fn integer_step(model: &Model) -> Vec<Move> {
    let mut moves = Vec::new();
    for (idx, v) in model.variables().iter().enumerate() {
        if v.is_fixed() || !matches!(v.sense(), VariableSense::General) {
            continue;
        }
        let id = crate::model::VariableId(idx as u32);
        if v.value() + 1 <= v.upper_bound() {
            moves.push(Move::new(vec![(id, v.value() + 1)], MoveSense::IntegerStep, Vec::new()));
        }
        if v.value() - 1 >= v.lower_bound() {
            moves.push(Move::new(vec![(id, v.value() - 1)], MoveSense::IntegerStep, Vec::new()));
        }
    }
    moves
}

/// Within each selection group, a move assigning 1 to a non-holding member
/// and 0 to the current holder (`spec.md` §4.2, "Selection exchange").
pub fn selection_exchange(model: &Model) -> Vec<Move> {
    let mut moves = Vec::new();
    let values: Vec<i64> = model.variables().iter().map(|v| v.value()).collect();
    for group in model.selection_groups() {
        let Some(holder) = group.holding_member(&values) else {
            continue;
        };
        for &member in group.members() {
            if member == holder || model.variables()[member.index()].is_fixed() {
                continue;
            }
            moves.push(Move::new(
                vec![(holder, 0), (member, 1)],
                MoveSense::Selection,
                Vec::new(),
            ));
        }
    }
    moves
}

/// A user-supplied pair of variables, flipped simultaneously
/// (`spec.md` §4.2, "Two-flip").
pub fn two_flip(model: &Model) -> Vec<Move> {
    model
        .two_flip_pairs()
        .iter()
        .filter(|&&(a, b)| !model.variables()[a.index()].is_fixed() && !model.variables()[b.index()].is_fixed())
        .map(|&(a, b)| {
            let va = model.variables()[a.index()].value();
            let vb = model.variables()[b.index()].value();
            Move::new(vec![(a, 1 - va), (b, 1 - vb)], MoveSense::TwoFlip, Vec::new())
        })
        .collect()
}

/// Structural two-variable moves extracted from constraints with exactly
/// two nonzero terms (`spec.md` §4.2, "Aggregation, Precedence,
/// Variable-Bound"). Each constraint contributes at most one candidate
/// move per call, corrective toward satisfying it; `fired` excludes
/// constraints whose special move has already been applied once this
/// inner run (`spec.md` §4.5, "some special moves may fire at most once
/// per inner run").
pub fn special_moves(model: &Model, fired: &HashSet<(ConstraintId, MoveSense)>) -> Vec<Move> {
    let mut moves = Vec::new();
    for (idx, constraint) in model.constraints().iter().enumerate() {
        let cid = ConstraintId(idx as u32);
        let expression = &model.expressions()[constraint.expression().index()];
        if expression.terms().len() != 2 {
            continue;
        }
        let (&(va, ca), &(vb, cb)) = (&expression.terms()[0], &expression.terms()[1]);
        if model.variables()[va.index()].is_fixed() || model.variables()[vb.index()].is_fixed() {
            continue;
        }

        let sense = if constraint.sense() == ConstraintSense::Equal {
            MoveSense::Aggregation
        } else if (ca > 0.0) != (cb > 0.0) {
            MoveSense::Precedence
        } else {
            MoveSense::VariableBound
        };
        if fired.contains(&(cid, sense)) {
            continue;
        }

        let value_a = model.value(va);
        let value_b = model.value(vb);
        let expr_value = expression.value();
        let step_increases_expr = expr_value < 0.0;

        let mut alterations = Vec::new();
        let bounds_a = &model.variables()[va.index()];
        let bounds_b = &model.variables()[vb.index()];
        let delta_a = if step_increases_expr == (ca > 0.0) { 1 } else { -1 };
        let delta_b = if step_increases_expr == (cb > 0.0) { 1 } else { -1 };
        let new_a = value_a + delta_a;
        let new_b = value_b + delta_b;
        if new_a >= bounds_a.lower_bound() && new_a <= bounds_a.upper_bound() {
            alterations.push((va, new_a));
        }
        if new_b >= bounds_b.lower_bound() && new_b <= bounds_b.upper_bound() {
            alterations.push((vb, new_b));
        }
        if alterations.is_empty() {
            continue;
        }
        moves.push(Move::new(alterations, sense, vec![cid]));
    }
    moves
}
