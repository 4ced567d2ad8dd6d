//! Staging buffers that hold one row (a constraint or the objective) per notation
//! before it is flattened into the model.
//!
//! Every buffer has its notation's shape. The model clears all buffers after each
//! finalized row, so a row only ever sees coefficients written for it.
use indexmap::IndexMap;
use ndarray::{ArrayD, ArrayViewMutD, IxDyn};

use crate::optimize::error::ModelError;
use crate::optimize::notation::{clamp_infinity, NotationRegistry};
use crate::optimize::values::Values;

/// Location of a single coefficient within a notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoefIndex {
    /// Position in row-major (C) order over the whole notation
    Flat(usize),
    /// One index per dimension
    Multi(Vec<usize>),
}

impl Default for CoefIndex {
    fn default() -> Self {
        CoefIndex::Flat(0)
    }
}

impl From<usize> for CoefIndex {
    fn from(index: usize) -> Self {
        CoefIndex::Flat(index)
    }
}

impl From<Vec<usize>> for CoefIndex {
    fn from(index: Vec<usize>) -> Self {
        CoefIndex::Multi(index)
    }
}

impl<const N: usize> From<[usize; N]> for CoefIndex {
    fn from(index: [usize; N]) -> Self {
        CoefIndex::Multi(index.to_vec())
    }
}

impl From<(usize, usize)> for CoefIndex {
    fn from((i, j): (usize, usize)) -> Self {
        CoefIndex::Multi(vec![i, j])
    }
}

impl From<(usize, usize, usize)> for CoefIndex {
    fn from((i, j, k): (usize, usize, usize)) -> Self {
        CoefIndex::Multi(vec![i, j, k])
    }
}

impl CoefIndex {
    /// Resolve to one index per dimension of `shape`, or None if out of range
    pub fn to_multi(&self, shape: &[usize]) -> Option<Vec<usize>> {
        match self {
            CoefIndex::Flat(flat) => {
                if *flat >= shape.iter().product() {
                    return None;
                }
                let mut remaining = *flat;
                let mut index = vec![0; shape.len()];
                for (axis, &dim) in shape.iter().enumerate().rev() {
                    index[axis] = remaining % dim;
                    remaining /= dim;
                }
                Some(index)
            }
            CoefIndex::Multi(index) => {
                let in_range = index.len() == shape.len()
                    && index.iter().zip(shape).all(|(&i, &dim)| i < dim);
                in_range.then(|| index.clone())
            }
        }
    }

    fn as_vec(&self) -> Vec<usize> {
        match self {
            CoefIndex::Flat(flat) => vec![*flat],
            CoefIndex::Multi(index) => index.clone(),
        }
    }
}

/// Per notation scratch arrays, kept in the registry's declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientAccumulator {
    buffers: IndexMap<String, ArrayD<f64>>,
}

impl CoefficientAccumulator {
    /// Zero-filled buffers for every notation in `registry`
    pub fn new(registry: &NotationRegistry) -> Self {
        Self {
            buffers: registry
                .iter()
                .map(|n| (n.name.clone(), ArrayD::zeros(IxDyn(&n.shape))))
                .collect(),
        }
    }

    /// Current contents of a notation's buffer
    pub fn buffer(&self, name: &str) -> Result<&ArrayD<f64>, ModelError> {
        self.buffers
            .get(name)
            .ok_or_else(|| ModelError::UnknownNotation(name.to_string()))
    }

    fn buffer_mut(&mut self, name: &str) -> Result<&mut ArrayD<f64>, ModelError> {
        self.buffers
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownNotation(name.to_string()))
    }

    /// Zero-fill a single notation's buffer
    pub fn clear(&mut self, name: &str) -> Result<(), ModelError> {
        self.buffer_mut(name)?.fill(0.);
        Ok(())
    }

    /// Zero-fill every buffer
    pub fn clear_all(&mut self) {
        self.buffers.values_mut().for_each(|buffer| buffer.fill(0.));
    }

    /// True when every buffer is all zeros
    pub fn is_clear(&self) -> bool {
        self.buffers
            .values()
            .all(|buffer| buffer.iter().all(|&v| v == 0.))
    }

    /// Write one coefficient
    pub fn set_item(&mut self, name: &str, index: &CoefIndex, value: f64) -> Result<(), ModelError> {
        let buffer = self.buffer_mut(name)?;
        let shape = buffer.shape().to_vec();
        let position = index
            .to_multi(&shape)
            .ok_or_else(|| ModelError::IndexOutOfRange {
                name: name.to_string(),
                index: index.as_vec(),
                shape: shape.clone(),
            })?;
        buffer[IxDyn(&position)] = value;
        Ok(())
    }

    /// Replace the whole buffer, broadcasting a scalar
    pub fn set_dense(&mut self, name: &str, values: &Values) -> Result<(), ModelError> {
        let buffer = self.buffer_mut(name)?;
        let resolved = values.resolve(name, buffer.shape())?;
        *buffer = resolved;
        Ok(())
    }

    /// Hand a mutable view of the buffer to `callback`. Entries it doesn't touch keep
    /// their current value.
    pub fn set_via_callback<F>(&mut self, name: &str, callback: F) -> Result<(), ModelError>
    where
        F: FnOnce(ArrayViewMutD<'_, f64>),
    {
        let buffer = self.buffer_mut(name)?;
        callback(buffer.view_mut());
        Ok(())
    }

    /// Concatenate every buffer in declaration order, clamping infinities to `big_m`
    pub fn flatten(&self, big_m: f64) -> Vec<f64> {
        self.buffers
            .values()
            .flat_map(|buffer| buffer.iter().map(|&v| clamp_infinity(v, big_m)))
            .collect()
    }
}
