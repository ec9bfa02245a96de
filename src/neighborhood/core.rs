//! The [`Neighborhood`]: the live set of candidate moves plus the chain
//! pool discovered during search (`spec.md` §4.2).

use std::collections::HashSet;

use rand::Rng;

use crate::model::{ConstraintId, Model};

use super::generators;
use super::types::{Move, MoveSense};

/// Which screening mode is active for the current inner iteration,
/// expressed as the three accept flags [`Neighborhood::update_moves`]
/// consumes (`spec.md` §4.5 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprovabilityScreeningMode {
    Off,
    Soft,
    Aggressive,
    Intensive,
    /// The controller picks one of the four concrete modes each outer
    /// iteration (`SPEC_FULL.md` §4.6 `[ADD]`); never reaches the inner
    /// core directly.
    Automatic,
}

impl ImprovabilityScreeningMode {
    /// `(accept_all, accept_objective_improvable, accept_feasibility_improvable)`.
    pub fn accept_flags(self) -> (bool, bool, bool) {
        match self {
            ImprovabilityScreeningMode::Off => (true, true, true),
            ImprovabilityScreeningMode::Soft => (false, true, false),
            ImprovabilityScreeningMode::Aggressive => (false, false, true),
            ImprovabilityScreeningMode::Intensive => (false, true, true),
            ImprovabilityScreeningMode::Automatic => {
                unreachable!("Automatic is resolved by the controller before reaching the core")
            }
        }
    }
}

/// How the chain pool is cut down to its capacity when oversized
/// (`spec.md` §4.6.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainReduceMode {
    DropHighestOverlap,
    ShuffleThenTruncate,
}

/// The live candidate-move set plus the chain pool.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    moves: Vec<Move>,
    chain_pool: Vec<Move>,
    fired_special: HashSet<(ConstraintId, MoveSense)>,
    pub binary_enabled: bool,
    pub integer_enabled: bool,
    pub selection_enabled: bool,
    pub special_enabled: bool,
    pub two_flip_enabled: bool,
    pub chain_enabled: bool,
    pub chain_capacity: usize,
    pub overlap_threshold: f64,
}

impl Default for Neighborhood {
    fn default() -> Self {
        Self {
            moves: Vec::new(),
            chain_pool: Vec::new(),
            fired_special: HashSet::new(),
            binary_enabled: true,
            integer_enabled: true,
            selection_enabled: true,
            special_enabled: true,
            two_flip_enabled: true,
            chain_enabled: true,
            chain_capacity: 32,
            overlap_threshold: 0.2,
        }
    }
}

impl Neighborhood {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_ptrs(&self) -> &[Move] {
        &self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn chain_pool(&self) -> &[Move] {
        &self.chain_pool
    }

    /// Regenerates the candidate list from every enabled generator, then
    /// applies the three accept flags (`spec.md` §4.2). Generation runs
    /// single-threaded: it is cheap relative to evaluation, which is what
    /// `spec.md` §5 parallelises.
    pub fn update_moves(&mut self, model: &Model, accept_all: bool, accept_obj_improvable: bool, accept_feas_improvable: bool) {
        let mut moves = Vec::new();
        if self.binary_enabled {
            moves.extend(generators::binary_flip(model));
        }
        if self.integer_enabled {
            moves.extend(generators::integer_step(model));
        }
        if self.selection_enabled {
            moves.extend(generators::selection_exchange(model));
        }
        if self.special_enabled {
            moves.extend(generators::special_moves(model, &self.fired_special));
        }
        if self.two_flip_enabled {
            moves.extend(generators::two_flip(model));
        }
        if self.chain_enabled {
            moves.extend(self.chain_pool.iter().cloned());
        }

        if !accept_all {
            let obj_flags: Vec<bool> = model.variables().iter().map(|v| v.is_objective_improvable()).collect();
            let feas_flags: Vec<bool> = model.variables().iter().map(|v| v.is_feasibility_improvable()).collect();
            moves.retain(|mv| {
                (accept_obj_improvable && mv.touches_any(&obj_flags)) || (accept_feas_improvable && mv.touches_any(&feas_flags))
            });
        }

        self.moves = moves;
    }

    pub fn shuffle_moves(&mut self, rng: &mut impl Rng) {
        crate::random::shuffle(&mut self.moves, rng);
    }

    /// Truncates the candidate array to a `rate` prefix (`spec.md` §4.2,
    /// "Optional `move_preserve_rate`").
    pub fn truncate_preserve_rate(&mut self, rate: f64) {
        let keep = ((self.moves.len() as f64) * rate.clamp(0.0, 1.0)).ceil() as usize;
        self.moves.truncate(keep.max(1).min(self.moves.len()));
    }

    /// Marks a once-only special move's constraint as fired so it is not
    /// regenerated for the rest of this inner run.
    pub fn mark_special_fired(&mut self, constraint: ConstraintId, sense: MoveSense) {
        self.fired_special.insert((constraint, sense));
    }

    /// Clears per-run bookkeeping (not the chain pool, which is an
    /// outer-loop concern — see `Neighborhood::clear_chain_pool`).
    pub fn reset_run_state(&mut self) {
        self.fired_special.clear();
    }

    /// Registers a chain candidate (and implicitly its caller-supplied
    /// complement) if it passes the overlap-rate and no-duplicate-variable
    /// gates (`spec.md` §4.2, §4.5 step 8).
    pub fn register_chain(&mut self, candidate: Move) {
        if candidate.overlap_rate <= self.overlap_threshold || candidate.has_duplicate_variables() {
            return;
        }
        self.chain_pool.push(candidate);
    }

    /// Sort-and-deduplicate the chain pool by its alteration list, then cap
    /// it to `chain_capacity` using `mode` (`spec.md` §4.6.11).
    pub fn maintain_chain_pool(&mut self, mode: ChainReduceMode, rng: &mut impl Rng) {
        self.chain_pool.sort_by(|a, b| {
            a.alterations
                .iter()
                .map(|(v, val)| (v.0, *val))
                .collect::<Vec<_>>()
                .cmp(&b.alterations.iter().map(|(v, val)| (v.0, *val)).collect::<Vec<_>>())
        });
        self.chain_pool.dedup_by(|a, b| a.alterations == b.alterations);

        if self.chain_pool.len() <= self.chain_capacity {
            return;
        }
        match mode {
            ChainReduceMode::DropHighestOverlap => {
                self.chain_pool
                    .sort_by(|a, b| b.overlap_rate.total_cmp(&a.overlap_rate));
                self.chain_pool.truncate(self.chain_capacity);
            }
            ChainReduceMode::ShuffleThenTruncate => {
                crate::random::shuffle(&mut self.chain_pool, rng);
                self.chain_pool.truncate(self.chain_capacity);
            }
        }
    }

    pub fn clear_chain_pool(&mut self) {
        self.chain_pool.clear();
    }
}
