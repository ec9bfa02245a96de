//! Tabu Search metaheuristic engine for mixed-integer programs, with an
//! adaptive Lagrangian-style outer controller.
//!
//! A [`model::Model`] holds a reduced MIP in arena form: integer and binary
//! variables, linear expressions, and constraints compared against zero.
//! [`controller::Controller`] repeatedly hands the model to
//! [`tabu::TabuSearchCore`] for a bounded inner run, then tightens or
//! relaxes constraint penalties, widens or narrows the tabu tenure, and
//! chooses which of the three tracked incumbents to restart the next run
//! from.
//!
//! # Usage
//!
//! Build a [`model::Model`], call [`model::Model::build`] once, then solve
//! it with [`controller::Controller::solve`]:
//!
//! ```ignore
//! let mut model = Model::new(objective_expression_id, Sense::Minimize);
//! // ... add_variable / add_expression / add_constraint / set up the model ...
//! model.build()?;
//!
//! let controller = Controller::new();
//! let (solution, status, archive) = controller.solve(
//!     &mut model,
//!     &ControllerOptions::default(),
//!     &TabuOptions::default(),
//! )?;
//! ```

pub mod constants;
pub mod controller;
pub mod error;
pub mod incumbent;
pub mod log_table;
pub mod memory;
pub mod model;
pub mod neighborhood;
pub mod random;
pub mod solution;
pub mod tabu;

pub use controller::{Controller, ControllerOptions, Verbose};
pub use error::{SolverError, SolverResult};
pub use model::Model;
pub use solution::{NamedSolution, SolutionArchive, StatusRecord, TerminationReason};
pub use tabu::{TabuOptions, TabuRunParameters};
