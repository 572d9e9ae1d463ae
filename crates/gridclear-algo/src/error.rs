//! Error taxonomy for market clearing.

use gridclear_core::CaseError;
use gridclear_solver::SolverError;
use thiserror::Error;

/// Errors returned by a clearing run.
///
/// Validation problems surface as [`ClearingError::Case`] before any model is
/// built. Solver outcomes that describe the market itself (no feasible
/// dispatch, unbounded welfare) get their own variants; everything the
/// backend could not finish is [`ClearingError::Solver`].
#[derive(Debug, Error)]
pub enum ClearingError {
    #[error(transparent)]
    Case(#[from] CaseError),

    /// No dispatch satisfies balance, bounds and line limits.
    #[error("Market is infeasible: {0}")]
    InfeasibleMarket(String),

    /// Welfare can grow without bound (free angles with zero susceptance,
    /// missing quantity limits).
    #[error("Market is unbounded: {0}")]
    UnboundedMarket(String),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

pub type ClearingResult<T> = Result<T, ClearingError>;

impl ClearingError {
    /// True for outcomes caused by the case data rather than the backend.
    pub fn is_market_outcome(&self) -> bool {
        matches!(
            self,
            ClearingError::InfeasibleMarket(_) | ClearingError::UnboundedMarket(_)
        )
    }
}
