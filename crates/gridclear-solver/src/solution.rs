//! Raw solver output, before any market interpretation.

use crate::problem::{ConstraintId, VarId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Termination status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LpStatus {
    /// Optimal solution found.
    Optimal,
    /// No point satisfies the constraints.
    Infeasible,
    /// The objective can improve without limit.
    Unbounded,
    /// Numerical failure, iteration limit or any other backend problem.
    SolverError,
}

impl LpStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, LpStatus::Optimal)
    }
}

impl fmt::Display for LpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LpStatus::Optimal => write!(f, "optimal"),
            LpStatus::Infeasible => write!(f, "infeasible"),
            LpStatus::Unbounded => write!(f, "unbounded"),
            LpStatus::SolverError => write!(f, "solver_error"),
        }
    }
}

/// Primal (and optionally dual) values indexed like the submitted problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpSolution {
    pub status: LpStatus,
    /// One value per variable; empty unless `status` is optimal
    pub primal: Vec<f64>,
    /// Objective in the problem's own sense
    pub objective: f64,
    /// Sensitivity of the optimal objective to each constraint's rhs
    pub duals: Option<Vec<f64>>,
    /// Free-form backend message for non-optimal outcomes
    pub message: Option<String>,
}

impl LpSolution {
    pub fn optimal(primal: Vec<f64>, objective: f64) -> Self {
        Self {
            status: LpStatus::Optimal,
            primal,
            objective,
            duals: None,
            message: None,
        }
    }

    /// A terminal non-optimal outcome with no usable values.
    pub fn terminated(status: LpStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            primal: Vec::new(),
            objective: f64::NAN,
            duals: None,
            message: Some(message.into()),
        }
    }

    pub fn with_duals(mut self, duals: Vec<f64>) -> Self {
        self.duals = Some(duals);
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_success()
    }

    pub fn value(&self, var: VarId) -> Option<f64> {
        self.primal.get(var.index()).copied()
    }

    pub fn dual(&self, constraint: ConstraintId) -> Option<f64> {
        self.duals
            .as_ref()
            .and_then(|duals| duals.get(constraint.index()).copied())
    }
}
