//! Short-term and long-term search memory (`spec.md` §3, §4.3).
//!
//! Short-term memory records, per variable, the iteration at which it was
//! last altered; this backs the tabu test. Long-term memory counts how many
//! times each variable has been altered; this backs the frequency penalty
//! and the primal-intensity scalar the controller uses to widen or narrow
//! the tabu tenure.

use rand::Rng;

use crate::constants::INITIAL_LAST_UPDATE_ITERATION;
use crate::model::VariableId;
use crate::neighborhood::Move;
use crate::random;

/// Whether a move is deemed tabu if *any* or *all* of its altered variables
/// are still within tenure (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabuMode {
    /// Permissible iff at least one altered variable has aged past tenure.
    All,
    /// Permissible iff every altered variable has aged past tenure.
    Any,
}

/// Per-variable short-term and long-term memory plus the derived
/// frequency/intensity statistics the tabu test and the controller's
/// tenure-adaptation step consume.
#[derive(Debug, Clone)]
pub struct Memory {
    last_update_iteration: Vec<i64>,
    update_count: Vec<u64>,
    total_update_count: u64,
}

impl Memory {
    /// Allocates memory for `number_of_variables` variables, all unvisited.
    pub fn new(number_of_variables: usize) -> Self {
        Self {
            last_update_iteration: vec![INITIAL_LAST_UPDATE_ITERATION; number_of_variables],
            update_count: vec![0; number_of_variables],
            total_update_count: 0,
        }
    }

    /// Resets the short-term memory's stamps to the initial sentinel,
    /// without touching the long-term update counts (`spec.md` §4.5,
    /// "Reset the last update iterations" at the start of each inner run
    /// in `original_source`'s `tabu_search.h`).
    pub fn reset_last_update_iterations(&mut self) {
        self.last_update_iteration.fill(INITIAL_LAST_UPDATE_ITERATION);
    }

    pub fn total_update_count(&self) -> u64 {
        self.total_update_count
    }

    pub fn last_update_iteration(&self, variable: VariableId) -> i64 {
        self.last_update_iteration[variable.index()]
    }

    pub fn update_count(&self, variable: VariableId) -> u64 {
        self.update_count[variable.index()]
    }

    /// Records that `mv` was applied at `iteration`. Each altered variable's
    /// last-update stamp is jittered by `U[-random_width, +random_width]` so
    /// that ties between variables do not cycle in lockstep (`spec.md`
    /// §4.3, §4.5 step 7).
    pub fn update(&mut self, mv: &Move, iteration: i64, random_width: i64, rng: &mut impl Rng) {
        for &(variable, _) in &mv.alterations {
            let jitter = random::jitter(random_width, rng);
            self.last_update_iteration[variable.index()] = iteration + jitter;
            self.update_count[variable.index()] += 1;
            self.total_update_count += 1;
        }
    }

    /// `spec.md` §4.3: All-mode permissible iff at least one altered
    /// variable aged past `tenure`; Any-mode iff every altered variable did.
    pub fn is_permissible(&self, mv: &Move, iteration: i64, tenure: i64, mode: TabuMode) -> bool {
        match mode {
            TabuMode::All => mv
                .alterations
                .iter()
                .any(|&(v, _)| iteration - self.last_update_iteration(v) >= tenure),
            TabuMode::Any => mv
                .alterations
                .iter()
                .all(|&(v, _)| iteration - self.last_update_iteration(v) >= tenure),
        }
    }

    /// `(sum of update_count over altered variables) * coefficient /
    /// total_update_count`, zero at iteration 0 (`spec.md` §4.3).
    pub fn frequency_penalty(&self, mv: &Move, iteration: i64, coefficient: f64) -> f64 {
        if iteration == 0 || self.total_update_count == 0 {
            return 0.0;
        }
        let move_update_count: u64 = mv.alterations.iter().map(|&(v, _)| self.update_count(v)).sum();
        move_update_count as f64 * coefficient / self.total_update_count as f64
    }

    /// `Σ (update_count/total_update_count)²` — a proxy for how concentrated
    /// the search has become on a small set of variables (`spec.md` §4.3,
    /// §9 GLOSSARY "Primal intensity").
    pub fn primal_intensity(&self) -> f64 {
        if self.total_update_count == 0 {
            return 0.0;
        }
        let total = self.total_update_count as f64;
        self.update_count.iter().map(|&c| (c as f64 / total).powi(2)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighborhood::MoveSense;

    #[test]
    fn fresh_memory_is_never_tabu() {
        let memory = Memory::new(4);
        let mv = Move::new(vec![(VariableId(0), 1)], MoveSense::BinaryFlip, Vec::new());
        assert!(memory.is_permissible(&mv, 0, 10, TabuMode::All));
        assert!(memory.is_permissible(&mv, 0, 10, TabuMode::Any));
    }

    #[test]
    fn update_counts_and_frequency_accumulate() {
        let mut memory = Memory::new(2);
        let mut rng = crate::random::create_rng(1);
        let mv = Move::new(vec![(VariableId(0), 1)], MoveSense::BinaryFlip, Vec::new());
        memory.update(&mv, 5, 0, &mut rng);
        memory.update(&mv, 6, 0, &mut rng);

        assert_eq!(memory.update_count(VariableId(0)), 2);
        assert_eq!(memory.total_update_count(), 2);
        assert_eq!(memory.last_update_iteration(VariableId(0)), 6);

        let penalty = memory.frequency_penalty(&mv, 7, 1e-5);
        assert!((penalty - (2.0 * 1e-5 / 2.0)).abs() < 1e-12);
        assert_eq!(memory.frequency_penalty(&mv, 0, 1e-5), 0.0);
    }

    #[test]
    fn all_vs_any_tabu_mode() {
        let mut memory = Memory::new(2);
        let mut rng = crate::random::create_rng(1);
        let mv = Move::new(vec![(VariableId(0), 1), (VariableId(1), 1)], MoveSense::TwoFlip, Vec::new());
        memory.update(&mv, 0, 0, &mut rng);
        // Only variable 0's recency is refreshed at iteration 10; variable 1 stays fresh-tabu.
        let single = Move::new(vec![(VariableId(0), 0)], MoveSense::BinaryFlip, Vec::new());
        memory.update(&single, 10, 0, &mut rng);

        // At iteration 10, variable 0 aged 0, variable 1 aged 10.
        assert!(memory.is_permissible(&mv, 10, 5, TabuMode::All));
        assert!(!memory.is_permissible(&mv, 10, 5, TabuMode::Any));
    }

    #[test]
    fn primal_intensity_grows_with_concentration() {
        let mut memory = Memory::new(2);
        let mut rng = crate::random::create_rng(1);
        let mv0 = Move::new(vec![(VariableId(0), 1)], MoveSense::BinaryFlip, Vec::new());
        memory.update(&mv0, 0, 0, &mut rng);
        memory.update(&mv0, 1, 0, &mut rng);
        memory.update(&mv0, 2, 0, &mut rng);
        // All updates concentrated on variable 0: intensity should be 1.0.
        assert!((memory.primal_intensity() - 1.0).abs() < 1e-12);
    }
}
