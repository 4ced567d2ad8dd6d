//! Errors raised while building, assembling, and solving a model
use thiserror::Error;

use crate::optimize::solvers::SolverError;
use crate::optimize::OptimizationStatus;

/// Errors associated with the Model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Malformed notation registration (bad shape, duplicate name, bound/shape mismatch)
    #[error("Invalid notation `{name}`: {reason}")]
    Configuration { name: String, reason: String },
    /// A constraint or objective referenced a notation that was never registered
    #[error("Tried to access notation `{0}` which is not in the model")]
    UnknownNotation(String),
    /// Coefficient index outside of the notation's shape
    #[error("Index {index:?} is out of range for notation `{name}` with shape {shape:?}")]
    IndexOutOfRange {
        name: String,
        index: Vec<usize>,
        shape: Vec<usize>,
    },
    /// Dense coefficients whose shape disagrees with the notation's shape
    #[error("Coefficients for notation `{name}` have shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    /// Unsupported relational operator
    #[error("Unknown constraint relation `{0}`, expected one of =, <=, >=")]
    InvalidRelation(String),
    /// A flat vector whose length is not the model's flat dimension
    #[error("Flat vector has length {found}, the model's flat dimension is {expected}")]
    LengthMismatch { expected: usize, found: usize },
    /// Solver input was requested before an objective was set
    #[error("Tried to solve a model without an objective")]
    NoObjective,
    /// The backend finished without an optimal solution
    #[error("Solver finished with status {0}")]
    SolveFailed(OptimizationStatus),
    /// Failure reported at the solver boundary
    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl ModelError {
    pub(crate) fn configuration(name: &str, reason: impl Into<String>) -> Self {
        ModelError::Configuration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
