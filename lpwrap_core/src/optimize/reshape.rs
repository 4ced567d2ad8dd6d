//! Conversion between flat solver vectors and per-notation shaped arrays
use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use tracing::error;

use crate::optimize::error::ModelError;
use crate::optimize::model::Model;
use crate::optimize::notation::NotationRegistry;

impl NotationRegistry {
    /// Split a flat vector into one array per notation, each with its original shape
    pub fn reshape(&self, flat: &[f64]) -> Result<IndexMap<String, ArrayD<f64>>, ModelError> {
        if flat.len() != self.total_dimension() {
            error!(
                expected = self.total_dimension(),
                found = flat.len(),
                "flat vector length does not match the notation layout"
            );
            return Err(ModelError::LengthMismatch {
                expected: self.total_dimension(),
                found: flat.len(),
            });
        }
        self.iter()
            .map(|n| {
                let values = flat[n.flat_range()].to_vec();
                ArrayD::from_shape_vec(IxDyn(&n.shape), values)
                    .map(|array| (n.name.clone(), array))
                    .map_err(|_| ModelError::ShapeMismatch {
                        name: n.name.clone(),
                        expected: n.shape.clone(),
                        found: vec![n.length],
                    })
            })
            .collect()
    }

    /// Concatenate per-notation arrays into a flat vector in declaration order.
    ///
    /// Every notation must be present with its exact shape.
    pub fn flatten(&self, values: &IndexMap<String, ArrayD<f64>>) -> Result<Vec<f64>, ModelError> {
        let mut flat = Vec::with_capacity(self.total_dimension());
        for n in self.iter() {
            let array = values
                .get(&n.name)
                .ok_or_else(|| ModelError::UnknownNotation(n.name.clone()))?;
            if array.shape() != n.shape.as_slice() {
                return Err(ModelError::ShapeMismatch {
                    name: n.name.clone(),
                    expected: n.shape.clone(),
                    found: array.shape().to_vec(),
                });
            }
            flat.extend(array.iter().copied());
        }
        Ok(flat)
    }
}

impl Model {
    /// Reshape a flat solution vector into named, shaped arrays
    pub fn reshape(&self, flat: &[f64]) -> Result<IndexMap<String, ArrayD<f64>>, ModelError> {
        self.registry.reshape(flat)
    }
}
