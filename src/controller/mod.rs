//! The outer controller: adapts penalties, tabu tenure, the neighborhood,
//! and the restart solution between successive Tabu Search Core runs
//! (`spec.md` §4.6).

mod config;
mod runner;
mod state;

pub use config::{ControllerOptions, Verbose};
pub use runner::Controller;
pub use state::RestartChoice;
