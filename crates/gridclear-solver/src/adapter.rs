//! The contract every LP backend implements.

use crate::error::SolverResult;
use crate::problem::LpProblem;
use crate::solution::LpSolution;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Knobs passed to a backend for one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Feasibility / optimality tolerance
    pub tolerance: f64,
    /// Iteration cap handed to the backend
    pub max_iterations: u32,
    /// Wall-clock limit; enforced by the backend when it can and always by
    /// [`solve_with_deadline`](crate::runner::solve_with_deadline)
    #[serde(with = "duration_secs")]
    pub time_limit: Duration,
    /// Ask the backend for constraint duals
    pub compute_duals: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 200,
            time_limit: Duration::from_secs(300),
            compute_duals: true,
        }
    }
}

impl SolveOptions {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn without_duals(mut self) -> Self {
        self.compute_duals = false;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// A linear programming backend.
///
/// Implementations translate an [`LpProblem`] into their native form, solve
/// it and report values indexed exactly like the input. They never interpret
/// the model: an infeasible problem is an `Ok` with
/// [`LpStatus::Infeasible`](crate::LpStatus::Infeasible), not an error.
///
/// Duals, when produced, follow one convention regardless of the backend:
/// `duals[k]` is the rate of change of the optimal objective, in the
/// problem's own sense, per unit increase of constraint `k`'s right-hand
/// side.
pub trait SolverAdapter: Send + Sync {
    /// Stable identifier, e.g. `"clarabel"`.
    fn id(&self) -> &str;

    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> SolverResult<LpSolution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SolveOptions::default();
        assert_eq!(opts.tolerance, 1e-6);
        assert_eq!(opts.time_limit, Duration::from_secs(300));
        assert!(opts.compute_duals);
    }

    #[test]
    fn test_builder_helpers() {
        let opts = SolveOptions::default()
            .with_time_limit(Duration::from_millis(1500))
            .with_tolerance(1e-8)
            .without_duals();
        assert_eq!(opts.time_limit.as_millis(), 1500);
        assert_eq!(opts.tolerance, 1e-8);
        assert!(!opts.compute_duals);
    }

    #[test]
    fn test_time_limit_serializes_as_seconds() {
        let opts = SolveOptions::default().with_time_limit(Duration::from_millis(2500));
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["time_limit"], 2.5);

        let parsed: SolveOptions = serde_json::from_str(r#"{"time_limit": 4}"#).unwrap();
        assert_eq!(parsed.time_limit, Duration::from_secs(4));
        assert_eq!(parsed.tolerance, 1e-6);
    }
}
