//! Boundary between a model and the LP/MIP backend that solves it
#[cfg(feature = "minilp")]
pub mod microlp;

use thiserror::Error;

use crate::optimize::assembler::SolverInput;
use crate::optimize::constraint::Relation;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::OptimizationStatus;

/// Errors raised by a solver backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// An operation needed a problem but `create_empty` hasn't been called
    #[error("No problem has been created in the solver")]
    NotCreated,
    /// Values were requested before a successful solve
    #[error("The problem has not been solved")]
    NotSolved,
    /// A vector handed to the solver doesn't match the number of variables
    #[error("Expected {expected} values, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// Integer variables were requested from a continuous-only backend
    #[error("Solver doesn't support integer variables")]
    UnsupportedIntegerVariables,
    /// The configured backend isn't compiled in
    #[error("Solver {0} is not available")]
    Unavailable(String),
    /// Backend specific failure
    #[error("Solver backend error: {0}")]
    Backend(String),
}

/// Incremental interface to a solver backend.
///
/// A problem is built with `create_empty` followed by the setters and one
/// `append_constraint_row` per row, then solved. [`Solver::load`] does the whole
/// sequence from a batch [`SolverInput`]. A backend holding session state frees it in
/// `release`; [`SolverSession`] guarantees that call.
pub trait Solver {
    /// Name used in logs
    fn name(&self) -> &'static str;

    fn integer_variable_capable(&self) -> bool;

    fn create_empty(&mut self, num_variables: usize) -> Result<(), SolverError>;

    /// Mark flat indices which must take integer values
    fn set_integer_flags(&mut self, integer_indices: &[usize]) -> Result<(), SolverError>;

    fn set_lower_bounds(&mut self, lower_bounds: &[f64]) -> Result<(), SolverError>;

    fn set_upper_bounds(&mut self, upper_bounds: &[f64]) -> Result<(), SolverError>;

    fn set_objective(&mut self, coefficients: &[f64]) -> Result<(), SolverError>;

    fn set_direction(&mut self, sense: ObjectiveSense) -> Result<(), SolverError>;

    fn append_constraint_row(
        &mut self,
        coefficients: &[f64],
        relation: Relation,
        rhs: f64,
    ) -> Result<(), SolverError>;

    fn set_scaling(&mut self, scale: bool) -> Result<(), SolverError>;

    fn solve(&mut self) -> Result<OptimizationStatus, SolverError>;

    fn objective_value(&self) -> Result<f64, SolverError>;

    /// Value of every variable, in flat index order
    fn variable_values(&self) -> Result<Vec<f64>, SolverError>;

    /// Drop any problem and solution state held by the backend
    fn release(&mut self);

    /// Build the problem from a batch input
    fn load(&mut self, input: &SolverInput) -> Result<(), SolverError> {
        if !input.integer_indices.is_empty() && !self.integer_variable_capable() {
            return Err(SolverError::UnsupportedIntegerVariables);
        }
        self.create_empty(input.num_variables())?;
        self.set_integer_flags(&input.integer_indices)?;
        self.set_lower_bounds(&input.lower_bounds)?;
        self.set_upper_bounds(&input.upper_bounds)?;
        self.set_objective(&input.objective)?;
        self.set_direction(input.sense)?;
        for (coefficients, relation, rhs) in input.rows() {
            self.append_constraint_row(&coefficients, relation, rhs)?;
        }
        self.set_scaling(input.scale)
    }
}

/// A loaded problem that is released when the session goes out of scope
pub struct SolverSession<'s, S: Solver> {
    solver: &'s mut S,
}

impl<'s, S: Solver> SolverSession<'s, S> {
    /// Load `input` into `solver`. If loading fails the solver is released before the
    /// error is returned.
    pub fn open(solver: &'s mut S, input: &SolverInput) -> Result<Self, SolverError> {
        let mut session = Self { solver };
        session.solver.load(input)?;
        Ok(session)
    }

    pub fn solve(&mut self) -> Result<OptimizationStatus, SolverError> {
        self.solver.solve()
    }

    pub fn objective_value(&self) -> Result<f64, SolverError> {
        self.solver.objective_value()
    }

    pub fn variable_values(&self) -> Result<Vec<f64>, SolverError> {
        self.solver.variable_values()
    }
}

impl<S: Solver> Drop for SolverSession<'_, S> {
    fn drop(&mut self) {
        self.solver.release();
    }
}

/// Check that a per-variable vector has one value per variable
pub(crate) fn check_dimension(expected: usize, values: &[f64]) -> Result<(), SolverError> {
    if values.len() != expected {
        return Err(SolverError::DimensionMismatch {
            expected,
            found: values.len(),
        });
    }
    Ok(())
}
