//! Selection groups: "exactly one of these binaries is 1" one-hot
//! constraints, surfaced to move generation separately from a general
//! linear constraint (`spec.md` §4.2, "Selection exchange").

use super::variable::VariableId;

/// A set of binary variables whose values must sum to 1.
#[derive(Debug, Clone)]
pub struct SelectionGroup {
    pub(crate) members: Vec<VariableId>,
}

impl SelectionGroup {
    pub fn new(members: Vec<VariableId>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[VariableId] {
        &self.members
    }

    /// The member currently holding value 1, found by linear scan of the
    /// (small, by construction) member list against `values`.
    pub fn holding_member(&self, values: &[i64]) -> Option<VariableId> {
        self.members
            .iter()
            .copied()
            .find(|v| values[v.index()] == 1)
    }
}
