//! Provides the model: a fixed set of notations, the rows built over them, and the
//! objective they are solved against
use cfg_if::cfg_if;
use tracing::{info, warn};

use crate::configuration::{self, Solver as ConfiguredSolver};
use crate::optimize::accumulator::CoefficientAccumulator;
use crate::optimize::constraint::Constraint;
use crate::optimize::error::ModelError;
use crate::optimize::notation::{Notation, NotationRegistry};
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::solvers::{Solver, SolverSession};
use crate::optimize::values::Values;
use crate::optimize::{ModelSolution, OptimizationStatus};

/// A linear or mixed integer program over named, shaped notations
///
/// The set of notations is fixed at construction. Constraints are appended with
/// [`Model::add_by_items`], [`Model::add_by_matrix`] or [`Model::add_by_callback`], the
/// objective is set with [`Model::set_objective`], and [`Model::solve`] hands the
/// assembled problem to a [`Solver`].
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) registry: NotationRegistry,
    pub(crate) accumulator: CoefficientAccumulator,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective: Option<Objective>,
    pub(crate) status: OptimizationStatus,
}

impl Model {
    // region Creation Functions
    /// Create a model from notations, laid out in iteration order
    ///
    /// # Examples
    /// ```rust
    /// use lpwrap_core::optimize::model::Model;
    /// use lpwrap_core::optimize::notation::{Notation, NotationBuilder, VariableType};
    /// let model = Model::new([
    ///     ("x", Notation::scalar()),
    ///     (
    ///         "y",
    ///         NotationBuilder::default()
    ///             .shape(vec![2, 2])
    ///             .upper_bound(1.)
    ///             .variable_type(VariableType::Integer)
    ///             .build()
    ///             .unwrap(),
    ///     ),
    /// ])
    /// .unwrap();
    /// assert_eq!(model.registry().total_dimension(), 5);
    /// ```
    pub fn new<I, S>(notations: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (S, Notation)>,
        S: Into<String>,
    {
        Ok(Self::from_registry(NotationRegistry::from_notations(notations)?))
    }

    /// Create a model over an already populated registry
    pub fn from_registry(registry: NotationRegistry) -> Self {
        let accumulator = CoefficientAccumulator::new(&registry);
        Self {
            registry,
            accumulator,
            constraints: Vec::new(),
            objective: None,
            status: OptimizationStatus::Unoptimized,
        }
    }
    // endregion Creation Functions

    // region Accessors
    pub fn registry(&self) -> &NotationRegistry {
        &self.registry
    }

    pub fn accumulator(&self) -> &CoefficientAccumulator {
        &self.accumulator
    }

    /// Finalized constraint rows, in insertion order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Status of the most recent solve
    pub fn status(&self) -> OptimizationStatus {
        self.status
    }
    // endregion Accessors

    // region Solve
    /// Solve against the objective recorded by [`Model::set_objective`].
    ///
    /// The backend session is released before returning, whatever the outcome.
    pub fn solve<S: Solver>(&mut self, solver: &mut S, scale: bool) -> Result<ModelSolution, ModelError> {
        let input = self.build_solver_input(scale)?;
        info!(
            backend = solver.name(),
            variables = input.num_variables(),
            constraints = input.num_constraints(),
            "creating solver problem"
        );
        let mut session = SolverSession::open(solver, &input)?;
        info!("solving");
        let status = session.solve()?;
        self.status = status;
        if status != OptimizationStatus::Optimal {
            warn!(%status, "solver finished without an optimal solution");
            return Err(ModelError::SolveFailed(status));
        }
        let objective_value = session.objective_value()?;
        let flat = session.variable_values()?;
        drop(session);

        let values = self.reshape(&flat)?;
        info!(objective_value, "solved");
        Ok(ModelSolution {
            status,
            objective_value,
            values,
        })
    }

    /// Set the objective and solve in one call
    pub fn solve_with<S, I, N, V>(
        &mut self,
        solver: &mut S,
        objective: I,
        sense: ObjectiveSense,
        scale: bool,
    ) -> Result<ModelSolution, ModelError>
    where
        S: Solver,
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Values>,
    {
        self.set_objective(objective, sense)?;
        self.solve(solver, scale)
    }

    /// Solve with the backend named in the global configuration
    pub fn solve_default(&mut self, scale: bool) -> Result<ModelSolution, ModelError> {
        match configuration::current().solver {
            ConfiguredSolver::MicroLp => {
                cfg_if! {
                    if #[cfg(feature = "minilp")] {
                        let mut solver = crate::optimize::solvers::microlp::MicroLpSolver::new();
                        self.solve(&mut solver, scale)
                    } else {
                        Err(ModelError::Solver(crate::optimize::solvers::SolverError::Unavailable(
                            "microlp (enable the `minilp` feature)".to_string(),
                        )))
                    }
                }
            }
        }
    }
    // endregion Solve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::constraint::{Coefficient, Relation};
    use crate::optimize::solvers::tests::RecordingSolver;

    fn two_variable_model() -> Model {
        Model::new([("x", Notation::scalar()), ("y", Notation::scalar())]).unwrap()
    }

    #[test]
    fn new_model() {
        let model = two_variable_model();
        assert_eq!(model.registry().total_dimension(), 2);
        assert!(model.constraints().is_empty());
        assert!(model.objective().is_none());
        assert_eq!(model.status(), OptimizationStatus::Unoptimized);
        assert!(model.accumulator().is_clear());
    }

    #[test]
    fn solve_without_objective() {
        let mut model = two_variable_model();
        let mut solver = RecordingSolver::optimal(0., vec![0., 0.]);
        assert_eq!(
            model.solve(&mut solver, false).map(|_| ()),
            Err(ModelError::NoObjective)
        );
        assert_eq!(solver.released, 0);
    }

    #[test]
    fn solve_reshapes_and_releases() {
        let mut model = two_variable_model();
        model
            .add_by_items(
                &[Coefficient::new("x", 1.), Coefficient::new("y", 1.)],
                75.,
                Relation::Leq,
            )
            .unwrap();
        let mut solver = RecordingSolver::optimal(10725., vec![75., 0.]);
        let solution = model
            .solve_with(&mut solver, [("x", 143.), ("y", 60.)], ObjectiveSense::Maximize, true)
            .unwrap();

        assert!((solution.objective_value - 10725.).abs() < 1e-9);
        assert_eq!(solution.get("x").unwrap().shape(), &[1]);
        assert!((solution.get("x").unwrap()[[0]] - 75.).abs() < 1e-9);
        assert_eq!(model.status(), OptimizationStatus::Optimal);
        assert_eq!(solver.released, 1);
        assert_eq!(solver.rows.len(), 1);
        assert_eq!(solver.objective, vec![143., 60.]);
        assert_eq!(solver.sense, Some(ObjectiveSense::Maximize));
        assert_eq!(solver.scale, Some(true));
    }

    #[test]
    fn failed_solve_reports_status() {
        let mut model = two_variable_model();
        let mut solver = RecordingSolver::with_status(OptimizationStatus::Infeasible);
        let result = model.solve_with(&mut solver, [("x", 1.)], ObjectiveSense::Minimize, false);
        match result {
            Err(ModelError::SolveFailed(OptimizationStatus::Infeasible)) => {}
            _ => panic!("Infeasible status not surfaced"),
        }
        assert_eq!(model.status(), OptimizationStatus::Infeasible);
        // the session is released on the failure path too
        assert_eq!(solver.released, 1);
    }

    #[test]
    fn wrong_solution_length() {
        let mut model = two_variable_model();
        let mut solver = RecordingSolver::optimal(1., vec![1., 2., 3.]);
        let result = model.solve_with(&mut solver, [("x", 1.)], ObjectiveSense::Minimize, false);
        assert_eq!(
            result.map(|_| ()),
            Err(ModelError::LengthMismatch {
                expected: 2,
                found: 3
            })
        );
    }
}
