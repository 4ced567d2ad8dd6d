//! Scalar-or-array values used for bounds and dense coefficients
use ndarray::{Array, ArrayD, Dimension, IxDyn};

use crate::optimize::error::ModelError;

/// A value given either as a single number to be broadcast over a notation's shape,
/// or as an array which must match that shape exactly
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Single value used for every element
    Scalar(f64),
    /// Explicit values, one per element
    Array(ArrayD<f64>),
}

/// Bounds of a notation share the scalar-or-array representation
pub type Bound = Values;

impl Values {
    /// Materialize into a standard layout array of `shape`.
    ///
    /// `name` is only used to label the error.
    pub fn resolve(&self, name: &str, shape: &[usize]) -> Result<ArrayD<f64>, ModelError> {
        match self {
            Values::Scalar(value) => Ok(ArrayD::from_elem(IxDyn(shape), *value)),
            Values::Array(array) => {
                if array.shape() != shape {
                    return Err(ModelError::ShapeMismatch {
                        name: name.to_string(),
                        expected: shape.to_vec(),
                        found: array.shape().to_vec(),
                    });
                }
                Ok(array.as_standard_layout().into_owned())
            }
        }
    }
}

impl From<f64> for Values {
    fn from(value: f64) -> Self {
        Values::Scalar(value)
    }
}

impl From<i32> for Values {
    fn from(value: i32) -> Self {
        Values::Scalar(value as f64)
    }
}

impl From<Vec<f64>> for Values {
    fn from(values: Vec<f64>) -> Self {
        Values::Array(Array::from_vec(values).into_dyn())
    }
}

impl From<&[f64]> for Values {
    fn from(values: &[f64]) -> Self {
        Values::from(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Values {
    fn from(values: [f64; N]) -> Self {
        Values::from(values.to_vec())
    }
}

impl<D: Dimension> From<Array<f64, D>> for Values {
    fn from(array: Array<f64, D>) -> Self {
        Values::Array(array.into_dyn())
    }
}
