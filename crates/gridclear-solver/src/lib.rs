//! Solver boundary for gridclear.
//!
//! This crate defines a backend-neutral linear program ([`LpProblem`]), the
//! raw result shape ([`LpSolution`]) and the [`SolverAdapter`] trait that
//! concrete backends implement. It knows nothing about markets; the
//! clearing formulation lives in `gridclear-algo`.
//!
//! ```text
//! ModelBuilder ──LpProblem──> SolverAdapter ──LpSolution──> ResultExtractor
//!                                   │
//!                   runner::solve_with_deadline (tokio blocking pool,
//!                   timeout + cancel)
//! ```

pub mod adapter;
pub mod error;
pub mod problem;
pub mod runner;
pub mod solution;

pub use adapter::{SolveOptions, SolverAdapter};
pub use error::{SolverError, SolverResult};
pub use problem::{
    ConstraintId, ConstraintSense, LinearConstraint, LpProblem, ObjectiveSense, VarId, VariableDef,
};
pub use runner::{cancel_pair, solve_with_deadline, CancelHandle, CancelToken};
pub use solution::{LpSolution, LpStatus};
