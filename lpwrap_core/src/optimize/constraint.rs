//! Provides types for representing finalized constraint rows and the coefficients used
//! to author them
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::optimize::accumulator::CoefIndex;
use crate::optimize::error::ModelError;

/// Comparison between the left hand side of a constraint and its right hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `lhs = rhs`
    Eq,
    /// `lhs <= rhs`
    Leq,
    /// `lhs >= rhs`
    Geq,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Eq => write!(f, "="),
            Relation::Leq => write!(f, "<="),
            Relation::Geq => write!(f, ">="),
        }
    }
}

impl FromStr for Relation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => Ok(Relation::Eq),
            "<=" | "leq" | "le" => Ok(Relation::Leq),
            ">=" | "geq" | "ge" => Ok(Relation::Geq),
            _ => Err(ModelError::InvalidRelation(s.to_string())),
        }
    }
}

/// A finalized row of the constraint matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// One coefficient per flat index, infinities already clamped
    pub coefficients: Vec<f64>,
    /// The right hand side of the constraint
    pub rhs: f64,
    pub relation: Relation,
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let terms = self
            .coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.)
            .map(|(i, c)| format!("{}*v{}", c, i))
            .collect::<Vec<_>>();
        if terms.is_empty() {
            write!(f, "0 {} {}", self.relation, self.rhs)
        } else {
            write!(f, "{} {} {}", terms.join(" + "), self.relation, self.rhs)
        }
    }
}

/// A single coefficient written into a notation's buffer, used by
/// [`crate::optimize::model::Model::add_by_items`]
///
/// # Examples
/// ```rust
/// use lpwrap_core::optimize::constraint::Coefficient;
/// // 2 * x[0]
/// let first = Coefficient::new("x", 2.);
/// // 3 * y[1, 2]
/// let second = Coefficient::new("y", 3.).at((1usize, 2usize));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub index: CoefIndex,
    pub value: f64,
}

impl Coefficient {
    /// Coefficient for the first element of notation `name`
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            index: CoefIndex::default(),
            value,
        }
    }

    /// Move the coefficient to `index`
    pub fn at(mut self, index: impl Into<CoefIndex>) -> Self {
        self.index = index.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_relations() {
        assert_eq!("<=".parse::<Relation>().unwrap(), Relation::Leq);
        assert_eq!(" >= ".parse::<Relation>().unwrap(), Relation::Geq);
        assert_eq!("=".parse::<Relation>().unwrap(), Relation::Eq);
        assert_eq!("GEQ".parse::<Relation>().unwrap(), Relation::Geq);
        assert_eq!(
            "<".parse::<Relation>(),
            Err(ModelError::InvalidRelation("<".to_string()))
        );
        for relation in [Relation::Eq, Relation::Leq, Relation::Geq] {
            assert_eq!(relation.to_string().parse::<Relation>().unwrap(), relation);
        }
    }

    #[test]
    fn coefficient_helper() {
        let c = Coefficient::new("x", 2.);
        assert_eq!(c.index, CoefIndex::Flat(0));
        let c = Coefficient::new("y", 1.).at([1usize, 2]);
        assert_eq!(c.index, CoefIndex::Multi(vec![1, 2]));
        let c = Coefficient::new("y", 1.).at(3usize);
        assert_eq!(c.index, CoefIndex::Flat(3));
    }

    #[test]
    fn display() {
        let cons = Constraint {
            coefficients: vec![2., 0., 1.],
            rhs: 4.,
            relation: Relation::Leq,
        };
        assert_eq!(cons.to_string(), "2*v0 + 1*v2 <= 4");
    }
}
