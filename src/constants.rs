//! Numeric constants shared across evaluation, memory, and the controller.
//!
//! Mirrors `original_source/printemps/constant/constant.h`; values are kept
//! identical so that penalty/tolerance behaviour matches the source exactly.

/// Tolerance below which a violation or score delta is treated as zero.
pub const EPSILON: f64 = 1e-5;

/// Tighter tolerance used for bit-for-bit round-trip checks (Testable
/// Property 8/9), where `EPSILON` would be too coarse.
pub const EPSILON_10: f64 = 1e-10;

/// Large additive penalty applied to an impermissible move's total score
/// (`spec.md` §4.5 step 5, `L1`).
pub const LARGE_VALUE_50: f64 = 1e50;

/// Larger additive penalty applied to a non-improving special move
/// (`spec.md` §4.5 step 5, `L2`; `L2 > L1`).
pub const LARGE_VALUE_100: f64 = 1e100;

/// Sentinel lower bound for a variable declared unbounded below.
pub const VARIABLE_LOWER_BOUND_SENTINEL: i64 = i64::MIN / 4;

/// Sentinel upper bound for a variable declared unbounded above.
pub const VARIABLE_UPPER_BOUND_SENTINEL: i64 = i64::MAX / 4;

/// Initial value of `Memory::last_update_iteration`, chosen so that
/// `current_iteration - last_update_iteration` exceeds any realistic tabu
/// tenure from iteration zero onward (`cppmh/solver/memory.h`).
pub const INITIAL_LAST_UPDATE_ITERATION: i64 = -1000;
