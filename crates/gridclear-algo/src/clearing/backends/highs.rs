//! HiGHS simplex backend (requires the native library).

use super::common::{check_feasibility, solve_empty, terminated, translate, Translation};
use good_lp::solvers::highs::highs;
use good_lp::{DualValues, Solution, SolutionWithDual, SolverModel};
use gridclear_solver::{
    LpProblem, LpSolution, ObjectiveSense, SolveOptions, SolverAdapter, SolverResult,
};
use tracing::debug;
use web_time::Instant;

/// HiGHS through good_lp. Preferred over Clarabel when compiled in.
#[derive(Debug, Default, Clone)]
pub struct HighsAdapter;

impl HighsAdapter {
    pub const ID: &'static str = "highs";

    pub fn new() -> Self {
        Self
    }
}

impl SolverAdapter for HighsAdapter {
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
        let mut model = unsolved
            .using(highs)
            .set_verbose(false)
            .set_time_limit(options.time_limit.as_secs_f64());

        let refs: Vec<_> = rows.into_iter().map(|row| model.add_constraint(row)).collect();
        let pin_refs: Vec<_> = pins.into_iter().map(|pin| model.add_constraint(pin)).collect();

        let mut solution = match model.solve() {
            Ok(solution) => solution,
            Err(err) => return Ok(terminated(Self::ID, err)),
        };

        let primal: Vec<f64> = handles.iter().map(|v| solution.value(*v)).collect();
        check_feasibility(Self::ID, problem, &primal, options);

        // HiGHS row duals are already objective sensitivities in the
        // model's own sense
        let (row_duals, pin_duals): (Vec<f64>, Vec<f64>) = {
            let duals = solution.compute_dual();
            (
                refs.into_iter().map(|r| duals.dual(r)).collect(),
                pin_refs.into_iter().map(|r| duals.dual(r)).collect(),
            )
        };
        let inner = solution.into_inner();
        let value = dual_objective(problem, &primal, &row_duals, &pin_duals, inner.dual_columns());

        let mut result = LpSolution::optimal(primal, value);
        if options.compute_duals {
            result = result.with_duals(row_duals);
        }

        debug!(
            backend = Self::ID,
            objective = result.objective,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "highs solve finished"
        );
        Ok(result)
    }
}

/// Objective value as HiGHS's dual solution states it.
///
/// HiGHS duals satisfy `c = Aᵀy + z` in either sense, so by strong duality
/// the optimum is `Σ y·rhs + Σ z·bound`, with each reduced cost charged at
/// the column bound the primal point sits on.
fn dual_objective(
    problem: &LpProblem,
    primal: &[f64],
    row_duals: &[f64],
    pin_duals: &[f64],
    column_duals: &[f64],
) -> f64 {
    let rows: f64 = problem
        .constraints()
        .iter()
        .zip(row_duals)
        .map(|(row, y)| y * row.rhs)
        .sum();
    let pins: f64 = problem
        .variables()
        .iter()
        .filter(|def| def.is_fixed())
        .zip(pin_duals)
        .map(|(def, y)| y * def.lower)
        .sum();
    let columns: f64 = problem
        .variables()
        .iter()
        .zip(primal)
        .zip(column_duals)
        .map(|((def, &x), z)| z * active_bound(def.lower, def.upper, def.is_fixed(), x))
        .sum();
    rows + pins + columns
}

fn active_bound(lower: f64, upper: f64, fixed: bool, x: f64) -> f64 {
    // pinned variables are free columns; their value enters through the pin row
    if fixed {
        return x;
    }
    match (lower.is_finite(), upper.is_finite()) {
        (true, true) if (x - lower).abs() <= (upper - x).abs() => lower,
        (true, true) => upper,
        (true, false) => lower,
        (false, true) => upper,
        (false, false) => x,
    }
}
