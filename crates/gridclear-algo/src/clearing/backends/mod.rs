//! Concrete [`SolverAdapter`](gridclear_solver::SolverAdapter) backends built
//! on good_lp.
//!
//! Both backends share one translation from `LpProblem` into good_lp
//! objects. Variables whose bounds coincide are declared free and pinned by
//! an explicit equality.

#[cfg(any(feature = "solver-clarabel", feature = "solver-highs"))]
mod common;

#[cfg(feature = "solver-clarabel")]
mod clarabel;
#[cfg(feature = "solver-highs")]
mod highs;

#[cfg(feature = "solver-clarabel")]
pub use self::clarabel::ClarabelAdapter;
#[cfg(feature = "solver-highs")]
pub use self::highs::HighsAdapter;
