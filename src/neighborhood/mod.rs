//! The Neighborhood: candidate [`Move`] generation plus the chain pool
//! discovered during search (`spec.md` §3, §4.2).

mod core;
mod generators;
mod types;

pub use self::core::{ChainReduceMode, ImprovabilityScreeningMode, Neighborhood};
pub use types::{Move, MoveSense};
