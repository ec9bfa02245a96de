//! Seeded RNG construction and shuffling helpers.
//!
//! The teacher crate (`u-metaheur`) pulls these from a sibling foundation
//! crate (`u_numflow`, called `u_optim` in some of its own modules — an
//! artifact of a mid-rename in the upstream source that was never
//! published here). That crate isn't part of this workspace, so this
//! module inlines the two helpers every runner needs directly on top of
//! `rand`, which the teacher already depends on.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Creates a deterministic RNG from a seed.
///
/// Used everywhere a run must be reproducible given a fixed seed, fixed
/// options, and a fixed thread count (see `spec.md` §5, Testable Property
/// 7).
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Shuffles a slice in place using a Fisher-Yates permutation.
pub fn shuffle<T>(items: &mut [T], rng: &mut impl rand::Rng) {
    items.shuffle(rng);
}

/// Draws an integer uniformly from `[-width, width]`, used to randomize
/// the tabu tenure's `last_update_iteration` stamp so that ties do not
/// cycle in lockstep (`spec.md` §4.3).
pub fn jitter(width: i64, rng: &mut impl rand::Rng) -> i64 {
    if width <= 0 {
        0
    } else {
        rng.random_range(-width..=width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = create_rng(7);
        let mut b = create_rng(7);
        let mut xs: Vec<i32> = (0..20).collect();
        let mut ys = xs.clone();
        shuffle(&mut xs, &mut a);
        shuffle(&mut ys, &mut b);
        assert_eq!(xs, ys);
    }

    #[test]
    fn jitter_bounds() {
        let mut rng = create_rng(1);
        for _ in 0..1000 {
            let j = jitter(5, &mut rng);
            assert!((-5..=5).contains(&j));
        }
        assert_eq!(jitter(0, &mut rng), 0);
    }
}
