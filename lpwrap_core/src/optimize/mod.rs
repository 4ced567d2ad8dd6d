//! Module for constructing and solving optimization problems over named, shaped
//! variable groups

pub mod accumulator;
pub mod assembler;
pub mod builder;
pub mod constraint;
pub mod error;
pub mod model;
pub mod notation;
pub mod objective;
pub mod reshape;
pub mod solvers;
pub mod values;

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use ndarray::ArrayD;

/// Struct representing the solution to an optimization problem
#[derive(Debug, Clone)]
pub struct ModelSolution {
    /// The status of the optimization problem, always [`OptimizationStatus::Optimal`]
    /// for a solution returned by [`model::Model::solve`]
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    pub objective_value: f64,
    /// Values of the variables at the optimum, keyed by notation name, each reshaped
    /// to the notation's shape
    pub values: IndexMap<String, ArrayD<f64>>,
}

impl ModelSolution {
    /// Values of a single notation at the optimum
    pub fn get(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.values.get(name)
    }
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptimizationStatus {
    /// Problem has not yet attempted to be optimized
    Unoptimized,
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// A numerical error occurred during solving
    NumericalError,
}

impl Display for OptimizationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationStatus::Unoptimized => write!(f, "UNOPTIMIZED"),
            OptimizationStatus::Optimal => write!(f, "OPTIMAL"),
            OptimizationStatus::Unbounded => write!(f, "UNBOUNDED"),
            OptimizationStatus::Infeasible => write!(f, "INFEASIBLE"),
            OptimizationStatus::NumericalError => write!(f, "NUMERICAL_ERROR"),
        }
    }
}
