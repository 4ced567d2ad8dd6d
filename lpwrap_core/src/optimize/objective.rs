//! Provides struct for representing an optimization problem's objective
use std::fmt::{Display, Formatter};

/// A flattened objective row together with its sense
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// One coefficient per flat index, infinities already clamped
    pub coefficients: Vec<f64>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    pub sense: ObjectiveSense,
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    #[default]
    Minimize,
    /// The objective should be maximized
    Maximize,
}

impl ObjectiveSense {
    /// Sense from a `minimize` flag
    pub fn from_minimize(minimize: bool) -> Self {
        if minimize {
            ObjectiveSense::Minimize
        } else {
            ObjectiveSense::Maximize
        }
    }

    pub fn is_minimize(&self) -> bool {
        *self == ObjectiveSense::Minimize
    }
}

impl Display for ObjectiveSense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveSense::Minimize => write!(f, "minimize"),
            ObjectiveSense::Maximize => write!(f, "maximize"),
        }
    }
}
