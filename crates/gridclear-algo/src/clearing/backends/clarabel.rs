//! Pure-Rust interior point backend.

use super::common::{check_feasibility, solve_empty, terminated, translate, Translation};
use good_lp::solvers::clarabel::clarabel;
use good_lp::{DualValues, Solution, SolutionWithDual, SolverModel};
use gridclear_solver::{
    LpProblem, LpSolution, LpStatus, ObjectiveSense, SolveOptions, SolverAdapter, SolverResult,
};
use ::clarabel::solver::{DefaultSolution, SolverStatus};
use tracing::debug;
use web_time::Instant;

/// Clarabel through good_lp. Always available, no native libraries.
#[derive(Debug, Default, Clone)]
pub struct ClarabelAdapter;

impl ClarabelAdapter {
    pub const ID: &'static str = "clarabel";

    pub fn new() -> Self {
        Self
    }
}

impl SolverAdapter for ClarabelAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> SolverResult<LpSolution> {
        problem.validate()?;
        if problem.num_vars() == 0 {
            return Ok(solve_empty(problem, options));
        }

        let start = Instant::now();
        let Translation {
            vars,
            handles,
            objective,
            rows,
            pins,
        } = translate(problem);

        let unsolved = match problem.sense() {
            ObjectiveSense::Maximize => vars.maximise(objective),
            ObjectiveSense::Minimize => vars.minimise(objective),
        };
        let mut model = unsolved.using(clarabel);
        model
            .settings()
            .verbose(false)
            .max_iter(options.max_iterations)
            .time_limit(options.time_limit.as_secs_f64());

        let refs: Vec<_> = rows.into_iter().map(|row| model.add_constraint(row)).collect();
        for pin in pins {
            model.add_constraint(pin);
        }

        let mut solution = match model.solve() {
            Ok(solution) => solution,
            Err(err) => return Ok(terminated(Self::ID, err)),
        };

        // good_lp hands back dual infeasible runs as solutions
        let raw: &DefaultSolution<f64> = solution.inner();
        if matches!(
            raw.status,
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible
        ) {
            return Ok(LpSolution::terminated(
                LpStatus::Unbounded,
                format!("clarabel reported {:?}", raw.status),
            ));
        }
        // clarabel always minimizes; a maximization objective was negated
        let value = match problem.sense() {
            ObjectiveSense::Maximize => -raw.obj_val,
            ObjectiveSense::Minimize => raw.obj_val,
        };

        let primal: Vec<f64> = handles.iter().map(|v| solution.value(*v)).collect();
        check_feasibility(Self::ID, problem, &primal, options);
        let mut result = LpSolution::optimal(primal, value);

        if options.compute_duals {
            let duals = solution.compute_dual();
            let values = refs.into_iter().map(|r| duals.dual(r)).collect();
            result = result.with_duals(values);
        }

        debug!(
            backend = Self::ID,
            objective = result.objective,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "clarabel solve finished"
        );
        Ok(result)
    }
}
