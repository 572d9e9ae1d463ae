//! Backend-neutral linear program description.
//!
//! ```text
//! optimize   c'x            (minimize or maximize)
//! subject to a_k'x {=,<=,>=} rhs_k     for every constraint k
//!            lower_v <= x_v <= upper_v  for every variable v
//! ```
//!
//! Bounds may be infinite. Variables and constraints carry names so that a
//! failing model can be dumped and read by a human.

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};

/// Index of a variable inside one [`LpProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(usize);

/// Index of a constraint inside one [`LpProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintId(usize);

impl VarId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl ConstraintId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Direction of optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Relation between a constraint's left-hand side and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintSense {
    Equal,
    LessEqual,
    GreaterEqual,
}

/// A decision variable and its bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl VariableDef {
    /// Zero-width interval; the variable is a constant.
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }

    pub fn is_free(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }
}

/// One linear row `Σ coeff·x sense rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Left-hand side evaluated at `values`.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.index()])
            .sum()
    }

    /// How far `values` are from satisfying this row (0 when satisfied).
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.sense {
            ConstraintSense::Equal => (lhs - self.rhs).abs(),
            ConstraintSense::LessEqual => (lhs - self.rhs).max(0.0),
            ConstraintSense::GreaterEqual => (self.rhs - lhs).max(0.0),
        }
    }
}

/// Complete LP handed to a [`SolverAdapter`](crate::SolverAdapter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpProblem {
    sense: ObjectiveSense,
    variables: Vec<VariableDef>,
    objective: Vec<f64>,
    constraints: Vec<LinearConstraint>,
}

impl LpProblem {
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            sense,
            variables: Vec::new(),
            objective: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a bounded variable with zero objective coefficient.
    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDef {
            name: name.into(),
            lower,
            upper,
        });
        self.objective.push(0.0);
        id
    }

    pub fn add_free_variable(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Add `coeff` to the objective coefficient of `var`.
    pub fn add_objective_term(&mut self, var: VarId, coeff: f64) {
        self.objective[var.index()] += coeff;
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(VarId, f64)>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(LinearConstraint {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
        id
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &VariableDef {
        &self.variables[id.index()]
    }

    /// Dense objective coefficients, one per variable.
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn constraint(&self, id: ConstraintId) -> &LinearConstraint {
        &self.constraints[id.index()]
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Largest bound or row violation of `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(var, &x)| (var.lower - x).max(x - var.upper).max(0.0));
        let rows = self.constraints.iter().map(|row| row.violation(values));
        bounds.chain(rows).fold(0.0, f64::max)
    }

    /// Reject descriptions no backend could make sense of.
    pub fn validate(&self) -> SolverResult<()> {
        for var in &self.variables {
            if var.lower.is_nan() || var.upper.is_nan() {
                return Err(SolverError::InvalidProblem(format!(
                    "variable {} has NaN bounds",
                    var.name
                )));
            }
            if var.lower > var.upper {
                return Err(SolverError::InvalidProblem(format!(
                    "variable {} has lower bound {} above upper bound {}",
                    var.name, var.lower, var.upper
                )));
            }
        }
        if let Some(idx) = self.objective.iter().position(|c| !c.is_finite()) {
            return Err(SolverError::InvalidProblem(format!(
                "objective coefficient of {} is not finite",
                self.variables[idx].name
            )));
        }
        for row in &self.constraints {
            if !row.rhs.is_finite() {
                return Err(SolverError::InvalidProblem(format!(
                    "constraint {} has non-finite rhs",
                    row.name
                )));
            }
            for (var, coeff) in &row.terms {
                if var.index() >= self.variables.len() {
                    return Err(SolverError::InvalidProblem(format!(
                        "constraint {} references unknown variable #{}",
                        row.name,
                        var.index()
                    )));
                }
                if !coeff.is_finite() {
                    return Err(SolverError::InvalidProblem(format!(
                        "constraint {} has non-finite coefficient",
                        row.name
                    )));
                }
            }
        }
        Ok(())
    }
}
