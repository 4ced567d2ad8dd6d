//! Module providing named, shaped groups of decision variables and the registry that
//! lays them out in a single flat index space
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;
use ndarray::ArrayD;
use tracing::debug;

use crate::configuration::CONFIGURATION;
use crate::optimize::error::ModelError;
use crate::optimize::values::{Bound, Values};

/// Represents the type of the variables in a notation
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq, Default)]
pub enum VariableType {
    /// Continuous variable
    #[default]
    Continuous,
    /// Integer variable
    Integer,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
        }
    }
}

/// Definition of a group of decision variables, before registration
///
/// # Examples
/// ```rust
/// use lpwrap_core::optimize::notation::{NotationBuilder, VariableType};
/// let x = NotationBuilder::default()
///     .shape(vec![2, 3])
///     .lower_bound(0.)
///     .upper_bound(1.)
///     .variable_type(VariableType::Integer)
///     .build()
///     .unwrap();
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct Notation {
    /// Dimensions of the group, a scalar group has shape `[1]`
    #[builder(default = "vec![1]")]
    pub shape: Vec<usize>,
    /// Lower bound, broadcast if scalar
    #[builder(default = "default_lower_bound()")]
    pub lower_bound: Bound,
    /// Upper bound, broadcast if scalar
    #[builder(default = "default_upper_bound()")]
    pub upper_bound: Bound,
    /// Whether the variables are integer or continuous
    #[builder(default = "VariableType::Continuous")]
    pub variable_type: VariableType,
}

impl Notation {
    /// A scalar continuous notation with the configured default bounds
    pub fn scalar() -> Self {
        Self::with_shape(vec![1])
    }

    /// A continuous notation of `shape` with the configured default bounds
    pub fn with_shape(shape: Vec<usize>) -> Self {
        Notation {
            shape,
            lower_bound: default_lower_bound(),
            upper_bound: default_upper_bound(),
            variable_type: VariableType::Continuous,
        }
    }
}

fn default_lower_bound() -> Bound {
    Values::Scalar(
        CONFIGURATION
            .read()
            .map(|config| config.lower_bound)
            .unwrap_or(0.),
    )
}

fn default_upper_bound() -> Bound {
    Values::Scalar(
        CONFIGURATION
            .read()
            .map(|config| config.upper_bound)
            .unwrap_or(f64::INFINITY),
    )
}

/// A notation after registration: bounds are materialized and its position in the
/// flat index space is fixed
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredNotation {
    pub name: String,
    pub shape: Vec<usize>,
    pub lower_bound: ArrayD<f64>,
    pub upper_bound: ArrayD<f64>,
    pub variable_type: VariableType,
    /// Start of this notation's values in the flat index space
    pub offset: usize,
    /// Number of values, the product of `shape`
    pub length: usize,
}

impl RegisteredNotation {
    /// Range of flat indices covered by this notation
    pub fn flat_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }
}

/// Ordered set of notations. Declaration order decides the flat layout and never changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotationRegistry {
    notations: IndexMap<String, RegisteredNotation>,
    total_dimension: usize,
}

impl NotationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every notation, in iteration order
    pub fn from_notations<I, S>(notations: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (S, Notation)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (name, notation) in notations {
            registry.register(name, notation)?;
        }
        Ok(registry)
    }

    /// Add a notation at the end of the flat layout
    pub fn register(&mut self, name: impl Into<String>, notation: Notation) -> Result<(), ModelError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ModelError::configuration(&name, "a notation with this name already exists"));
        }
        if notation.shape.is_empty() {
            return Err(ModelError::configuration(&name, "shape must have at least one dimension"));
        }
        if notation.shape.iter().any(|&dim| dim == 0) {
            return Err(ModelError::configuration(
                &name,
                format!("shape {:?} has a non-positive dimension", notation.shape),
            ));
        }
        let length = checked_length(&notation.shape).ok_or_else(|| {
            ModelError::configuration(
                &name,
                format!("shape {:?} has too many elements", notation.shape),
            )
        })?;
        let total_dimension = self
            .total_dimension
            .checked_add(length)
            .filter(|&total| checked_length(&[total]).is_some())
            .ok_or_else(|| {
                ModelError::configuration(&name, "flat dimension of the model is too large")
            })?;
        let lower_bound = resolve_bound(&name, &notation.lower_bound, &notation.shape)?;
        let upper_bound = resolve_bound(&name, &notation.upper_bound, &notation.shape)?;

        let offset = self.total_dimension;
        debug!(notation = %name, offset, length, "registered notation");
        self.total_dimension = total_dimension;
        self.notations.insert(
            name.clone(),
            RegisteredNotation {
                name,
                shape: notation.shape,
                lower_bound,
                upper_bound,
                variable_type: notation.variable_type,
                offset,
                length,
            },
        );
        Ok(())
    }

    /// Look up a registered notation
    pub fn get(&self, name: &str) -> Result<&RegisteredNotation, ModelError> {
        self.notations
            .get(name)
            .ok_or_else(|| ModelError::UnknownNotation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.notations.contains_key(name)
    }

    /// Notations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredNotation> {
        self.notations.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.notations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.notations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notations.is_empty()
    }

    /// Sum of the lengths of all notations
    pub fn total_dimension(&self) -> usize {
        self.total_dimension
    }

    /// Zero based flat indices of every integer variable, ascending
    pub fn integer_indices(&self) -> Vec<usize> {
        self.iter()
            .filter(|n| n.variable_type == VariableType::Integer)
            .flat_map(|n| n.flat_range())
            .collect()
    }

    /// Per flat index, whether the variable is integer
    pub fn integer_flags(&self) -> Vec<bool> {
        self.iter()
            .flat_map(|n| std::iter::repeat(n.variable_type == VariableType::Integer).take(n.length))
            .collect()
    }

    /// Flattened lower bounds, infinities clamped to `big_m`
    pub fn lower_bounds(&self, big_m: f64) -> Vec<f64> {
        self.iter()
            .flat_map(|n| n.lower_bound.iter().map(|&v| clamp_infinity(v, big_m)))
            .collect()
    }

    /// Flattened upper bounds, infinities clamped to `big_m`
    pub fn upper_bounds(&self, big_m: f64) -> Vec<f64> {
        self.iter()
            .flat_map(|n| n.upper_bound.iter().map(|&v| clamp_infinity(v, big_m)))
            .collect()
    }
}

/// Element count of `shape`, None if an `f64` array of it could not be allocated
fn checked_length(shape: &[usize]) -> Option<usize> {
    let length = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))?;
    let bytes = length.checked_mul(std::mem::size_of::<f64>())?;
    (bytes <= isize::MAX as usize).then_some(length)
}

fn resolve_bound(name: &str, bound: &Bound, shape: &[usize]) -> Result<ArrayD<f64>, ModelError> {
    bound.resolve(name, shape).map_err(|err| match err {
        ModelError::ShapeMismatch { expected, found, .. } => ModelError::configuration(
            name,
            format!("bound of shape {:?} does not match shape {:?}", found, expected),
        ),
        other => other,
    })
}

/// Replace `+inf` with `big_m` and `-inf` with `-big_m`, leaving finite values alone
pub fn clamp_infinity(value: f64, big_m: f64) -> f64 {
    if value == f64::INFINITY {
        big_m
    } else if value == f64::NEG_INFINITY {
        -big_m
    } else {
        value
    }
}
