//! Solver interface for the pure rust microlp solver
//!
//! microlp needs objective coefficients and bounds when a variable is created, so the
//! incremental calls are staged and the backend problem is built inside `solve`.
use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};
use tracing::{debug, warn};

use crate::configuration;
use crate::optimize::constraint::Relation;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::{check_dimension, Solver, SolverError};
use crate::optimize::OptimizationStatus;

#[derive(Clone, Debug, Default)]
pub struct MicroLpSolver {
    staged: Option<StagedProblem>,
    solution: Option<SolvedValues>,
}

#[derive(Clone, Debug)]
struct StagedProblem {
    integer: Vec<bool>,
    lower_bounds: Vec<f64>,
    upper_bounds: Vec<f64>,
    objective: Vec<f64>,
    sense: ObjectiveSense,
    /// Non-zero `(index, coefficient)` terms, relation, rhs
    rows: Vec<(Vec<(usize, f64)>, Relation, f64)>,
    scale: bool,
}

#[derive(Clone, Debug)]
struct SolvedValues {
    objective_value: f64,
    values: Vec<f64>,
}

/// The only place relations are mapped onto microlp's operators
fn comparison_op(relation: Relation) -> ComparisonOp {
    match relation {
        Relation::Eq => ComparisonOp::Eq,
        Relation::Leq => ComparisonOp::Le,
        Relation::Geq => ComparisonOp::Ge,
    }
}

fn direction(sense: ObjectiveSense) -> OptimizationDirection {
    match sense {
        ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        ObjectiveSense::Maximize => OptimizationDirection::Maximize,
    }
}

/// Snap values lying within `tolerance` of an integer onto it
fn snap(value: f64, tolerance: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= tolerance {
        rounded
    } else {
        value
    }
}

impl MicroLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn staged_mut(&mut self) -> Result<&mut StagedProblem, SolverError> {
        // Any change invalidates a previous solution
        self.solution = None;
        self.staged.as_mut().ok_or(SolverError::NotCreated)
    }
}

impl Solver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn integer_variable_capable(&self) -> bool {
        true
    }

    fn create_empty(&mut self, num_variables: usize) -> Result<(), SolverError> {
        self.solution = None;
        self.staged = Some(StagedProblem {
            integer: vec![false; num_variables],
            lower_bounds: vec![0.; num_variables],
            upper_bounds: vec![f64::INFINITY; num_variables],
            objective: vec![0.; num_variables],
            sense: ObjectiveSense::Minimize,
            rows: Vec::new(),
            scale: false,
        });
        Ok(())
    }

    fn set_integer_flags(&mut self, integer_indices: &[usize]) -> Result<(), SolverError> {
        let staged = self.staged_mut()?;
        let num_variables = staged.integer.len();
        staged.integer.fill(false);
        for &index in integer_indices {
            let flag = staged.integer.get_mut(index).ok_or_else(|| {
                SolverError::Backend(format!(
                    "integer index {} is outside of {} variables",
                    index, num_variables
                ))
            })?;
            *flag = true;
        }
        Ok(())
    }

    fn set_lower_bounds(&mut self, lower_bounds: &[f64]) -> Result<(), SolverError> {
        let staged = self.staged_mut()?;
        check_dimension(staged.lower_bounds.len(), lower_bounds)?;
        staged.lower_bounds.copy_from_slice(lower_bounds);
        Ok(())
    }

    fn set_upper_bounds(&mut self, upper_bounds: &[f64]) -> Result<(), SolverError> {
        let staged = self.staged_mut()?;
        check_dimension(staged.upper_bounds.len(), upper_bounds)?;
        staged.upper_bounds.copy_from_slice(upper_bounds);
        Ok(())
    }

    fn set_objective(&mut self, coefficients: &[f64]) -> Result<(), SolverError> {
        let staged = self.staged_mut()?;
        check_dimension(staged.objective.len(), coefficients)?;
        staged.objective.copy_from_slice(coefficients);
        Ok(())
    }

    fn set_direction(&mut self, sense: ObjectiveSense) -> Result<(), SolverError> {
        self.staged_mut()?.sense = sense;
        Ok(())
    }

    fn append_constraint_row(
        &mut self,
        coefficients: &[f64],
        relation: Relation,
        rhs: f64,
    ) -> Result<(), SolverError> {
        let staged = self.staged_mut()?;
        check_dimension(staged.objective.len(), coefficients)?;
        let terms = coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.)
            .map(|(index, c)| (index, *c))
            .collect();
        staged.rows.push((terms, relation, rhs));
        Ok(())
    }

    fn set_scaling(&mut self, scale: bool) -> Result<(), SolverError> {
        self.staged_mut()?.scale = scale;
        Ok(())
    }

    fn solve(&mut self) -> Result<OptimizationStatus, SolverError> {
        let staged = self.staged.as_ref().ok_or(SolverError::NotCreated)?;
        let mut problem = Problem::new(direction(staged.sense));
        let variables: Vec<Variable> = (0..staged.objective.len())
            .map(|i| {
                let (lower, upper) = (staged.lower_bounds[i], staged.upper_bounds[i]);
                if staged.integer[i] {
                    // float to int casts saturate
                    problem.add_integer_var(staged.objective[i], (lower.ceil() as i32, upper.floor() as i32))
                } else {
                    problem.add_var(staged.objective[i], (lower, upper))
                }
            })
            .collect();
        for (terms, relation, rhs) in &staged.rows {
            let expr = terms
                .iter()
                .map(|&(index, c)| (variables[index], c))
                .collect::<Vec<_>>();
            problem.add_constraint(expr, comparison_op(*relation), *rhs);
        }
        debug!(
            variables = variables.len(),
            constraints = staged.rows.len(),
            "built microlp problem"
        );

        let status = match problem.solve() {
            Ok(solution) => {
                let tolerance = configuration::current().tolerance;
                let values: Vec<f64> = variables
                    .iter()
                    .map(|&var| {
                        let value = solution[var];
                        if staged.scale {
                            snap(value, tolerance)
                        } else {
                            value
                        }
                    })
                    .collect();
                // Snapped values get an objective evaluated at those values
                let objective_value = if staged.scale {
                    staged
                        .objective
                        .iter()
                        .zip(&values)
                        .map(|(c, v)| c * v)
                        .sum()
                } else {
                    solution.objective()
                };
                self.solution = Some(SolvedValues {
                    objective_value,
                    values,
                });
                OptimizationStatus::Optimal
            }
            Err(microlp::Error::Infeasible) => OptimizationStatus::Infeasible,
            Err(microlp::Error::Unbounded) => OptimizationStatus::Unbounded,
            Err(err) => {
                warn!(error = ?err, "microlp failed to solve the problem");
                OptimizationStatus::NumericalError
            }
        };
        Ok(status)
    }

    fn objective_value(&self) -> Result<f64, SolverError> {
        self.solution
            .as_ref()
            .map(|solution| solution.objective_value)
            .ok_or(SolverError::NotSolved)
    }

    fn variable_values(&self) -> Result<Vec<f64>, SolverError> {
        self.solution
            .as_ref()
            .map(|solution| solution.values.clone())
            .ok_or(SolverError::NotSolved)
    }

    fn release(&mut self) {
        self.staged = None;
        self.solution = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(solver: &mut MicroLpSolver, n: usize, upper: f64) {
        solver.create_empty(n).unwrap();
        solver.set_lower_bounds(&vec![0.; n]).unwrap();
        solver.set_upper_bounds(&vec![upper; n]).unwrap();
    }

    #[test]
    fn relation_table() {
        assert!(matches!(comparison_op(Relation::Eq), ComparisonOp::Eq));
        assert!(matches!(comparison_op(Relation::Leq), ComparisonOp::Le));
        assert!(matches!(comparison_op(Relation::Geq), ComparisonOp::Ge));
    }

    #[test]
    fn needs_a_problem() {
        let mut solver = MicroLpSolver::new();
        assert_eq!(solver.set_objective(&[1.]), Err(SolverError::NotCreated));
        assert_eq!(solver.solve(), Err(SolverError::NotCreated));
        assert_eq!(solver.variable_values(), Err(SolverError::NotSolved));
    }

    #[test]
    fn dimension_checks() {
        let mut solver = MicroLpSolver::new();
        solver.create_empty(2).unwrap();
        assert_eq!(
            solver.set_objective(&[1., 2., 3.]),
            Err(SolverError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            solver.append_constraint_row(&[1.], Relation::Leq, 1.),
            Err(SolverError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            solver.set_integer_flags(&[2]),
            Err(SolverError::Backend(_))
        ));
    }

    #[test]
    fn solves_small_lp() {
        // max x + 2y, x + y <= 4, 2x + y >= 2, 0 <= y <= 3
        let mut solver = MicroLpSolver::new();
        solver.create_empty(2).unwrap();
        solver.set_lower_bounds(&[0., 0.]).unwrap();
        solver.set_upper_bounds(&[100_000., 3.]).unwrap();
        solver.set_objective(&[1., 2.]).unwrap();
        solver.set_direction(ObjectiveSense::Maximize).unwrap();
        solver.append_constraint_row(&[1., 1.], Relation::Leq, 4.).unwrap();
        solver.append_constraint_row(&[2., 1.], Relation::Geq, 2.).unwrap();
        solver.set_scaling(true).unwrap();

        assert_eq!(solver.solve().unwrap(), OptimizationStatus::Optimal);
        assert!((solver.objective_value().unwrap() - 7.).abs() < 1e-6);
        let values = solver.variable_values().unwrap();
        assert!((values[0] - 1.).abs() < 1e-6);
        assert!((values[1] - 3.).abs() < 1e-6);

        solver.release();
        assert_eq!(solver.objective_value(), Err(SolverError::NotSolved));
        assert_eq!(solver.solve(), Err(SolverError::NotCreated));
    }

    #[test]
    fn integer_variables() {
        // max x, 2x <= 3, x integer
        let mut solver = MicroLpSolver::new();
        create(&mut solver, 1, 10.);
        solver.set_integer_flags(&[0]).unwrap();
        solver.set_objective(&[1.]).unwrap();
        solver.set_direction(ObjectiveSense::Maximize).unwrap();
        solver.append_constraint_row(&[2.], Relation::Leq, 3.).unwrap();
        solver.set_scaling(true).unwrap();
        assert_eq!(solver.solve().unwrap(), OptimizationStatus::Optimal);
        assert_eq!(solver.variable_values().unwrap(), vec![1.]);
    }

    #[test]
    fn infeasible_and_unbounded() {
        let mut solver = MicroLpSolver::new();
        create(&mut solver, 1, 10.);
        solver.append_constraint_row(&[1.], Relation::Geq, 20.).unwrap();
        assert_eq!(solver.solve().unwrap(), OptimizationStatus::Infeasible);
        assert_eq!(solver.objective_value(), Err(SolverError::NotSolved));

        create(&mut solver, 1, f64::INFINITY);
        solver.set_objective(&[1.]).unwrap();
        solver.set_direction(ObjectiveSense::Maximize).unwrap();
        assert_eq!(solver.solve().unwrap(), OptimizationStatus::Unbounded);
    }

    #[test]
    fn snapped_objective_matches_values() {
        // max x, 3x <= 3.0000003
        for scale in [true, false] {
            let mut solver = MicroLpSolver::new();
            create(&mut solver, 1, 10.);
            solver.set_objective(&[1.]).unwrap();
            solver.set_direction(ObjectiveSense::Maximize).unwrap();
            solver.append_constraint_row(&[3.], Relation::Leq, 3.0000003).unwrap();
            solver.set_scaling(scale).unwrap();
            assert_eq!(solver.solve().unwrap(), OptimizationStatus::Optimal);
            let objective_value = solver.objective_value().unwrap();
            let x = solver.variable_values().unwrap()[0];
            assert!((objective_value - x).abs() < 1e-9);
            if scale {
                assert!((x - 1.).abs() < 1e-25);
            } else {
                assert!((x - 1.0000001).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn snapping() {
        assert!((snap(0.9999999, 1e-6) - 1.).abs() < 1e-25);
        assert!((snap(0.49999, 1e-6) - 0.49999).abs() < 1e-25);
        assert!((snap(-2.0000001, 1e-6) + 2.).abs() < 1e-25);
    }
}
