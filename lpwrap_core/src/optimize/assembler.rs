//! Model methods for recording the objective and assembling everything a solver needs
use nalgebra::DMatrix;
use tracing::debug;

use crate::configuration;
use crate::optimize::constraint::{Constraint, Relation};
use crate::optimize::error::ModelError;
use crate::optimize::model::Model;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::values::Values;

/// Flat inputs handed to a [`crate::optimize::solvers::Solver`]
#[derive(Debug, Clone, PartialEq)]
pub struct SolverInput {
    /// Objective coefficient per flat index
    pub objective: Vec<f64>,
    /// One row per constraint, in insertion order. Always `num_constraints x num_variables`,
    /// a single constraint is a 1 row matrix.
    pub constraint_matrix: DMatrix<f64>,
    pub rhs: Vec<f64>,
    pub relations: Vec<Relation>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
    /// Zero based flat indices that must take integer values
    pub integer_indices: Vec<usize>,
    pub sense: ObjectiveSense,
    pub scale: bool,
}

impl SolverInput {
    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraint_matrix.nrows()
    }

    /// Coefficients of row `index`, None past the last row
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.num_constraints())
            .then(|| self.constraint_matrix.row(index).iter().copied().collect())
    }

    /// `(coefficients, relation, rhs)` for each row, in order
    pub fn rows(&self) -> impl Iterator<Item = (Vec<f64>, Relation, f64)> + '_ {
        self.constraint_matrix
            .row_iter()
            .zip(self.relations.iter().zip(&self.rhs))
            .map(|(row, (relation, rhs))| (row.iter().copied().collect(), *relation, *rhs))
    }
}

/// The constraint side of a model without objective or bounds
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintMatrices {
    pub coefficients: DMatrix<f64>,
    pub rhs: Vec<f64>,
    pub relations: Vec<Relation>,
    pub integer_indices: Vec<usize>,
}

impl Model {
    /// Record the objective from whole coefficient arrays, one per notation. Notations that
    /// are not mentioned get zero coefficients. Scalars are broadcast over the notation.
    pub fn set_objective<I, N, V>(&mut self, objective: I, sense: ObjectiveSense) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Values>,
    {
        self.stage(|acc| {
            for (name, values) in objective {
                acc.set_dense(name.as_ref(), &values.into())?;
            }
            Ok(())
        })?;
        let coefficients = self.accumulator.flatten(configuration::big_m());
        self.accumulator.clear_all();
        debug!(%sense, "objective set");
        self.objective = Some(Objective {
            coefficients,
            sense,
        });
        Ok(())
    }

    /// Constraint matrix, right hand sides, relations, and integer indices
    pub fn generate_matrices(&self) -> ConstraintMatrices {
        ConstraintMatrices {
            coefficients: constraint_matrix(&self.constraints, self.registry.total_dimension()),
            rhs: self.constraints.iter().map(|c| c.rhs).collect(),
            relations: self.constraints.iter().map(|c| c.relation).collect(),
            integer_indices: self.registry.integer_indices(),
        }
    }

    /// Everything the solver needs, with bounds flattened in declaration order
    pub fn build_solver_input(&self, scale: bool) -> Result<SolverInput, ModelError> {
        let objective = self.objective.as_ref().ok_or(ModelError::NoObjective)?;
        let big_m = configuration::big_m();
        let matrices = self.generate_matrices();
        Ok(SolverInput {
            objective: objective.coefficients.clone(),
            constraint_matrix: matrices.coefficients,
            rhs: matrices.rhs,
            relations: matrices.relations,
            lower_bounds: self.registry.lower_bounds(big_m),
            upper_bounds: self.registry.upper_bounds(big_m),
            integer_indices: matrices.integer_indices,
            sense: objective.sense,
            scale,
        })
    }
}

fn constraint_matrix(rows: &[Constraint], num_variables: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), num_variables, |i, j| rows[i].coefficients[j])
}
