//! good_lp translation shared by every backend.

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, ResolutionError, Variable};
use gridclear_solver::{ConstraintSense, LpProblem, LpSolution, LpStatus, SolveOptions};
use tracing::warn;

/// good_lp view of one [`LpProblem`].
pub(crate) struct Translation {
    pub vars: ProblemVariables,
    /// One handle per problem variable, same order
    pub handles: Vec<Variable>,
    pub objective: Expression,
    /// One per problem row, same order
    pub rows: Vec<Constraint>,
    /// Equalities replacing zero-width bounds
    pub pins: Vec<Constraint>,
}

pub(crate) fn translate(problem: &LpProblem) -> Translation {
    let mut vars = ProblemVariables::new();
    let mut pins = Vec::new();

    let handles: Vec<Variable> = problem
        .variables()
        .iter()
        .map(|def| {
            if def.is_fixed() {
                let v = vars.add(variable().name(def.name.clone()));
                pins.push(constraint!(v == def.lower));
                return v;
            }
            let mut builder = variable().name(def.name.clone());
            if def.lower.is_finite() {
                builder = builder.min(def.lower);
            }
            if def.upper.is_finite() {
                builder = builder.max(def.upper);
            }
            vars.add(builder)
        })
        .collect();

    let objective: Expression = handles
        .iter()
        .zip(problem.objective())
        .filter(|(_, c)| **c != 0.0)
        .map(|(v, &c)| c * *v)
        .sum();

    // good_lp reports row duals against the right-hand side as written here
    let rows = problem
        .constraints()
        .iter()
        .map(|row| {
            let lhs: Expression = row
                .terms
                .iter()
                .map(|(var, coeff)| *coeff * handles[var.index()])
                .sum();
            let rhs = row.rhs;
            match row.sense {
                ConstraintSense::Equal => constraint!(lhs == rhs),
                ConstraintSense::LessEqual => constraint!(lhs <= rhs),
                ConstraintSense::GreaterEqual => constraint!(lhs >= rhs),
            }
        })
        .collect();

    Translation {
        vars,
        handles,
        objective,
        rows,
        pins,
    }
}

/// Non-optimal good_lp outcomes become statuses, never errors.
pub(crate) fn terminated(backend: &str, err: ResolutionError) -> LpSolution {
    match err {
        ResolutionError::Infeasible => LpSolution::terminated(LpStatus::Infeasible, "problem is infeasible"),
        ResolutionError::Unbounded => LpSolution::terminated(LpStatus::Unbounded, "problem is unbounded"),
        other => {
            warn!(backend, error = %other, "backend did not reach an optimum");
            LpSolution::terminated(LpStatus::SolverError, other.to_string())
        }
    }
}

/// Trivial problem with no variables: every row must hold at zero.
pub(crate) fn solve_empty(problem: &LpProblem, options: &SolveOptions) -> LpSolution {
    if problem.max_violation(&[]) > options.tolerance {
        return LpSolution::terminated(LpStatus::Infeasible, "constant rows are violated");
    }
    let solution = LpSolution::optimal(Vec::new(), 0.0);
    if options.compute_duals {
        solution.with_duals(vec![0.0; problem.num_constraints()])
    } else {
        solution
    }
}

/// Log when a backend returns a point noticeably outside the feasible set.
pub(crate) fn check_feasibility(backend: &str, problem: &LpProblem, primal: &[f64], options: &SolveOptions) {
    let violation = problem.max_violation(primal);
    let scale = problem
        .constraints()
        .iter()
        .map(|row| row.rhs.abs())
        .chain(problem.variables().iter().flat_map(|v| [v.lower, v.upper]))
        .filter(|x| x.is_finite())
        .fold(1.0, f64::max);
    if violation > options.tolerance * scale {
        warn!(backend, violation, "solution violates constraints beyond tolerance");
    }
}
