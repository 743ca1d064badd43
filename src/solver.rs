// Thin capability wrapper around the ILP backend.
//
// Constraint-building code elsewhere in the crate only ever sees this
// surface: add a binary variable, build linear terms, add <=/>=/= rows,
// maximize, and read values back. Swapping the backing solver library means
// touching this file only.

use good_lp::{constraint, default_solver, variable, Expression, ProblemVariables, Solution,
    SolverModel, Variable};
use thiserror::Error;

/// Opaque handle to a variable added to a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

#[derive(Debug, Error)]
pub enum SolverError {
    /// The backend failed for a reason other than infeasibility. Fatal:
    /// retrying with the same inputs would reproduce the failure.
    #[error("solver backend error: {0}")]
    Backend(String),
}

/// Result of a solve. Infeasibility is an expected, typed outcome, distinct
/// from backend failure.
pub enum Outcome {
    Optimal(Assignment),
    Infeasible,
}

/// Variable values of an optimal solution, indexed by [`VarId`].
pub struct Assignment {
    values: Vec<f64>,
}

impl Assignment {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }

    /// Whether a binary variable is set in this solution.
    pub fn is_one(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

/// An ILP under construction: variables, linear constraints, and (at solve
/// time) a maximization objective.
pub struct Model {
    vars: ProblemVariables,
    handles: Vec<Variable>,
    constraints: Vec<good_lp::Constraint>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Model {
            vars: ProblemVariables::new(),
            handles: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a 0/1 decision variable.
    pub fn add_binary(&mut self) -> VarId {
        let handle = self.vars.add(variable().binary());
        self.handles.push(handle);
        VarId(self.handles.len() - 1)
    }

    /// Linear term `coefficient * var`.
    pub fn term(&self, var: VarId, coefficient: f64) -> Expression {
        coefficient * self.handles[var.0]
    }

    /// Sum of linear terms.
    pub fn sum<I>(&self, terms: I) -> Expression
    where
        I: IntoIterator<Item = (VarId, f64)>,
    {
        terms
            .into_iter()
            .fold(Expression::default(), |acc, (var, coef)| {
                acc + self.term(var, coef)
            })
    }

    pub fn add_leq(&mut self, lhs: Expression, rhs: f64) {
        self.constraints.push(constraint!(lhs <= rhs));
    }

    pub fn add_geq(&mut self, lhs: Expression, rhs: f64) {
        self.constraints.push(constraint!(lhs >= rhs));
    }

    pub fn add_eq(&mut self, lhs: Expression, rhs: f64) {
        self.constraints.push(constraint!(lhs == rhs));
    }

    /// Solve with a maximization objective, consuming the model.
    pub fn maximise(self, objective: Expression) -> Result<Outcome, SolverError> {
        let Model {
            vars,
            handles,
            constraints,
        } = self;

        let mut problem = vars.maximise(objective).using(default_solver);
        for c in constraints {
            problem = problem.with(c);
        }

        match problem.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|v| solution.value(*v)).collect();
                Ok(Outcome::Optimal(Assignment { values }))
            }
            Err(good_lp::ResolutionError::Infeasible) => Ok(Outcome::Infeasible),
            Err(e) => Err(SolverError::Backend(e.to_string())),
        }
    }
}
