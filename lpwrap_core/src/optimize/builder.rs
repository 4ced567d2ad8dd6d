//! Model methods for authoring constraint rows.
//!
//! All three styles write into the model's [`CoefficientAccumulator`] and then finalize:
//! the buffers are flattened in declaration order, infinities are clamped, the row is
//! appended, and every buffer is cleared.
use ndarray::ArrayViewMutD;
use tracing::trace;

use crate::configuration;
use crate::optimize::accumulator::CoefficientAccumulator;
use crate::optimize::constraint::{Coefficient, Constraint, Relation};
use crate::optimize::error::ModelError;
use crate::optimize::model::Model;
use crate::optimize::values::Values;

/// Function given a mutable view of one notation's buffer
pub type CoefficientCallback<'a> = Box<dyn FnOnce(ArrayViewMutD<'_, f64>) + 'a>;

impl Model {
    /// Add a constraint by assigning single coefficients.
    ///
    /// # Examples
    /// ```rust
    /// use lpwrap_core::optimize::constraint::{Coefficient, Relation};
    /// use lpwrap_core::optimize::model::Model;
    /// use lpwrap_core::optimize::notation::Notation;
    /// let mut model = Model::new([("x", Notation::scalar()), ("y", Notation::scalar())]).unwrap();
    /// // 120x + 210y <= 15000
    /// model
    ///     .add_by_items(
    ///         &[Coefficient::new("x", 120.), Coefficient::new("y", 210.)],
    ///         15000.,
    ///         Relation::Leq,
    ///     )
    ///     .unwrap();
    /// assert_eq!(model.constraints()[0].coefficients, vec![120., 210.]);
    /// ```
    pub fn add_by_items(
        &mut self,
        coefficients: &[Coefficient],
        rhs: f64,
        relation: Relation,
    ) -> Result<(), ModelError> {
        self.stage(|acc| {
            for c in coefficients {
                acc.set_item(&c.name, &c.index, c.value)?;
            }
            Ok(())
        })?;
        self.finalize(rhs, relation);
        Ok(())
    }

    /// Add a constraint from whole coefficient arrays, one per notation. Notations that
    /// are not mentioned contribute zeros.
    pub fn add_by_matrix<I, N, V>(
        &mut self,
        coefficient_matrices: I,
        rhs: f64,
        relation: Relation,
    ) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Values>,
    {
        self.stage(|acc| {
            for (name, values) in coefficient_matrices {
                acc.set_dense(name.as_ref(), &values.into())?;
            }
            Ok(())
        })?;
        self.finalize(rhs, relation);
        Ok(())
    }

    /// Add a constraint by letting callbacks write into notation buffers.
    ///
    /// # Examples
    /// ```rust
    /// use lpwrap_core::optimize::builder::CoefficientCallback;
    /// use lpwrap_core::optimize::constraint::Relation;
    /// use lpwrap_core::optimize::model::Model;
    /// use lpwrap_core::optimize::notation::Notation;
    /// use ndarray::{ArrayViewMutD, Axis};
    /// let mut model = Model::new([("x", Notation::with_shape(vec![2, 2]))]).unwrap();
    /// // x[0, 1] + x[1, 1] <= 1
    /// let column: CoefficientCallback =
    ///     Box::new(|mut x: ArrayViewMutD<'_, f64>| x.index_axis_mut(Axis(1), 1).fill(1.));
    /// model.add_by_callback([("x", column)], 1., Relation::Leq).unwrap();
    /// assert_eq!(model.constraints()[0].coefficients, vec![0., 1., 0., 1.]);
    /// ```
    pub fn add_by_callback<'a, I, N>(
        &mut self,
        callbacks: I,
        rhs: f64,
        relation: Relation,
    ) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (N, CoefficientCallback<'a>)>,
        N: AsRef<str>,
    {
        self.stage(|acc| {
            for (name, callback) in callbacks {
                acc.set_via_callback(name.as_ref(), callback)?;
            }
            Ok(())
        })?;
        self.finalize(rhs, relation);
        Ok(())
    }

    /// Run `populate` against the buffers. On failure the buffers are cleared so the
    /// next row starts from zero.
    pub(crate) fn stage<F>(&mut self, populate: F) -> Result<(), ModelError>
    where
        F: FnOnce(&mut CoefficientAccumulator) -> Result<(), ModelError>,
    {
        if let Err(err) = populate(&mut self.accumulator) {
            self.accumulator.clear_all();
            return Err(err);
        }
        Ok(())
    }

    fn finalize(&mut self, rhs: f64, relation: Relation) {
        let coefficients = self.accumulator.flatten(configuration::big_m());
        self.constraints.push(Constraint {
            coefficients,
            rhs,
            relation,
        });
        self.accumulator.clear_all();
        trace!(row = self.constraints.len() - 1, %relation, rhs, "finalized constraint");
    }
}
