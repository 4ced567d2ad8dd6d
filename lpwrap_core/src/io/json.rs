//! Module providing JSON IO for lpwrap models and solutions
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::optimize::accumulator::CoefIndex;
use crate::optimize::constraint::{Coefficient, Relation};
use crate::optimize::error::ModelError;
use crate::optimize::model::Model;
use crate::optimize::notation::{NotationBuilder, NotationBuilderError, VariableType};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::values::Values;
use crate::optimize::ModelSolution;

// region JSON Model
/// Represents a JSON serialized model definition
#[derive(Serialize, Deserialize, Debug)]
struct JsonModel {
    notations: IndexMap<String, JsonNotation>,
    #[serde(default)]
    constraints: Vec<JsonConstraint>,
    objective: Option<JsonObjective>,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonNotation {
    shape: Option<JsonShape>,
    lower_bound: Option<Value>,
    upper_bound: Option<Value>,
    #[serde(rename = "type", default)]
    variable_type: JsonVariableType,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(untagged)]
enum JsonShape {
    Length(usize),
    Dimensions(Vec<usize>),
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "lowercase")]
enum JsonVariableType {
    #[default]
    Continuous,
    Integer,
}

/// A constraint given either as single coefficients or as whole matrices
#[derive(Serialize, Deserialize, Debug)]
struct JsonConstraint {
    #[serde(default)]
    coefficients: Vec<JsonCoefficient>,
    #[serde(default)]
    matrices: IndexMap<String, Value>,
    rhs: f64,
    relation: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonCoefficient {
    name: String,
    #[serde(default)]
    index: Option<JsonIndex>,
    value: f64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(untagged)]
enum JsonIndex {
    Flat(usize),
    Multi(Vec<usize>),
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonObjective {
    coefficients: IndexMap<String, Value>,
    sense: JsonSense,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum JsonSense {
    Minimize,
    Maximize,
}

/// Represents a JSON serialized solution
#[derive(Serialize, Deserialize, Debug)]
struct JsonSolution {
    status: String,
    objective_value: f64,
    values: IndexMap<String, Value>,
}
// endregion JSON Model

// region Conversions
impl From<JsonVariableType> for VariableType {
    fn from(t: JsonVariableType) -> Self {
        match t {
            JsonVariableType::Continuous => VariableType::Continuous,
            JsonVariableType::Integer => VariableType::Integer,
        }
    }
}

impl From<JsonSense> for ObjectiveSense {
    fn from(sense: JsonSense) -> Self {
        match sense {
            JsonSense::Minimize => ObjectiveSense::Minimize,
            JsonSense::Maximize => ObjectiveSense::Maximize,
        }
    }
}

impl From<JsonIndex> for CoefIndex {
    fn from(index: JsonIndex) -> Self {
        match index {
            JsonIndex::Flat(flat) => CoefIndex::Flat(flat),
            JsonIndex::Multi(index) => CoefIndex::Multi(index),
        }
    }
}

impl From<JsonCoefficient> for Coefficient {
    fn from(c: JsonCoefficient) -> Self {
        Coefficient {
            name: c.name,
            index: c.index.map(CoefIndex::from).unwrap_or_default(),
            value: c.value,
        }
    }
}

/// Convert a JSON number or (nested) array of numbers into values
fn json_to_values(name: &str, value: &Value) -> Result<Values, JsonError> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .map(Values::Scalar)
            .ok_or_else(|| JsonError::InvalidValue(name.to_string())),
        Value::Array(_) => {
            let mut shape = Vec::new();
            let mut level = value;
            while let Value::Array(items) = level {
                shape.push(items.len());
                match items.first() {
                    Some(first) => level = first,
                    None => break,
                }
            }
            let mut flat = Vec::with_capacity(shape.iter().product());
            collect_numbers(name, value, &shape, &mut flat)?;
            ArrayD::from_shape_vec(IxDyn(&shape), flat)
                .map(Values::Array)
                .map_err(|_| JsonError::Ragged(name.to_string()))
        }
        _ => Err(JsonError::InvalidValue(name.to_string())),
    }
}

fn collect_numbers(name: &str, value: &Value, shape: &[usize], flat: &mut Vec<f64>) -> Result<(), JsonError> {
    match (value, shape.split_first()) {
        (Value::Array(items), Some((&len, rest))) => {
            if items.len() != len {
                return Err(JsonError::Ragged(name.to_string()));
            }
            items
                .iter()
                .try_for_each(|item| collect_numbers(name, item, rest, flat))
        }
        (Value::Number(number), None) => {
            flat.push(
                number
                    .as_f64()
                    .ok_or_else(|| JsonError::InvalidValue(name.to_string()))?,
            );
            Ok(())
        }
        (Value::Array(_), None) | (Value::Number(_), Some(_)) => {
            Err(JsonError::Ragged(name.to_string()))
        }
        _ => Err(JsonError::InvalidValue(name.to_string())),
    }
}

/// Convert an array into nested JSON arrays
fn array_to_json(array: &ArrayD<f64>) -> Value {
    if array.ndim() == 0 {
        return array.iter().next().copied().map(Value::from).unwrap_or(Value::Null);
    }
    if array.ndim() == 1 {
        return Value::Array(array.iter().copied().map(Value::from).collect());
    }
    Value::Array(
        array
            .axis_iter(Axis(0))
            .map(|sub| array_to_json(&sub.to_owned()))
            .collect(),
    )
}

fn json_map_to_values(map: &IndexMap<String, Value>) -> Result<Vec<(String, Values)>, JsonError> {
    map.iter()
        .map(|(name, value)| Ok((name.clone(), json_to_values(name, value)?)))
        .collect()
}
// endregion Conversions

impl Model {
    /// Read a model definition from a JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        Model::from_json_str(&model_str)
    }

    /// Build a model from a JSON definition: notations, then constraints in order, then
    /// the objective if one is given
    pub fn from_json_str(model_str: &str) -> Result<Model, JsonError> {
        let json_model = match serde_json::from_str::<JsonModel>(model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        Model::from_json(json_model)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut notations = Vec::with_capacity(json_model.notations.len());
        for (name, n) in json_model.notations {
            let mut builder = NotationBuilder::default();
            builder.variable_type(VariableType::from(n.variable_type));
            match n.shape {
                Some(JsonShape::Length(len)) => {
                    builder.shape(vec![len]);
                }
                Some(JsonShape::Dimensions(dims)) => {
                    builder.shape(dims);
                }
                None => {}
            }
            if let Some(lower) = n.lower_bound.filter(|v| !v.is_null()) {
                builder.lower_bound(json_to_values(&name, &lower)?);
            }
            if let Some(upper) = n.upper_bound.filter(|v| !v.is_null()) {
                builder.upper_bound(json_to_values(&name, &upper)?);
            }
            notations.push((name, builder.build()?));
        }
        let mut model = Model::new(notations)?;

        for (row, constraint) in json_model.constraints.into_iter().enumerate() {
            let relation = constraint.relation.parse::<Relation>()?;
            match (constraint.coefficients.is_empty(), constraint.matrices.is_empty()) {
                (false, false) => return Err(JsonError::MixedConstraint(row)),
                (true, false) => {
                    let matrices = json_map_to_values(&constraint.matrices)?;
                    model.add_by_matrix(matrices, constraint.rhs, relation)?;
                }
                _ => {
                    let coefficients = constraint
                        .coefficients
                        .into_iter()
                        .map(Coefficient::from)
                        .collect::<Vec<_>>();
                    model.add_by_items(&coefficients, constraint.rhs, relation)?;
                }
            }
        }

        if let Some(objective) = json_model.objective {
            let coefficients = json_map_to_values(&objective.coefficients)?;
            model.set_objective(coefficients, objective.sense.into())?;
        }
        Ok(model)
    }
}

impl ModelSolution {
    /// Serialize the objective value, status, and nested per-notation arrays
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        let json_solution = JsonSolution {
            status: self.status.to_string(),
            objective_value: self.objective_value,
            values: self
                .values
                .iter()
                .map(|(name, array)| (name.clone(), array_to_json(array)))
                .collect(),
        };
        Ok(serde_json::to_string(&json_solution)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Values for `{0}` are not a rectangular array")]
    Ragged(String),
    #[error("Values for `{0}` must be numbers or arrays of numbers")]
    InvalidValue(String),
    #[error("Constraint {0} gives both coefficients and matrices")]
    MixedConstraint(usize),
    #[error("Unable to build notation")]
    UnableToBuildNotation(#[from] NotationBuilderError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

#[cfg(test)]
mod json_tests {
    use super::*;
    use crate::optimize::OptimizationStatus;
    use ndarray::array;
    use serde_json::json;

    const EXAMPLE: &str = r#"{
"notations": {
  "x": {"shape": 3, "lower_bound": 0, "upper_bound": [1, 1, 2], "type": "integer"},
  "y": {"shape": [2, 2]}
},
"constraints": [
  {"coefficients": [{"name": "x", "value": 2}, {"name": "x", "index": 1, "value": 1}],
   "rhs": 1, "relation": "<="},
  {"coefficients": [{"name": "y", "index": [1, 0], "value": 3}], "rhs": 2, "relation": ">="},
  {"matrices": {"x": [1, 1, 1]}, "rhs": 1, "relation": "="}
],
"objective": {"coefficients": {"x": [4, 2, 1], "y": -1}, "sense": "maximize"}
}"#;

    #[test]
    fn values_from_json() {
        assert_eq!(json_to_values("a", &json!(2.5)).unwrap(), Values::Scalar(2.5));
        assert_eq!(
            json_to_values("a", &json!([[1, 2], [3, 4]])).unwrap(),
            Values::Array(array![[1., 2.], [3., 4.]].into_dyn())
        );
        assert!(matches!(
            json_to_values("a", &json!([[1, 2], [3]])),
            Err(JsonError::Ragged(_))
        ));
        assert!(matches!(
            json_to_values("a", &json!([[1, 2], 3])),
            Err(JsonError::Ragged(_))
        ));
        assert!(matches!(
            json_to_values("a", &json!(["1"])),
            Err(JsonError::InvalidValue(_))
        ));
    }

    #[test]
    fn array_json() {
        assert_eq!(
            array_to_json(&array![[1., 2.], [3., 4.]].into_dyn()),
            json!([[1.0, 2.0], [3.0, 4.0]])
        );
        assert_eq!(array_to_json(&array![5.].into_dyn()), json!([5.0]));
    }

    #[test]
    fn model_from_json() {
        let model = Model::from_json_str(EXAMPLE).unwrap();
        let registry = model.registry();
        assert_eq!(registry.total_dimension(), 7);
        assert_eq!(registry.integer_indices(), vec![0, 1, 2]);
        assert_eq!(registry.upper_bounds(10.), vec![1., 1., 2., 10., 10., 10., 10.]);

        let rows = model.constraints();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].coefficients, vec![2., 1., 0., 0., 0., 0., 0.]);
        assert_eq!(rows[1].coefficients, vec![0., 0., 0., 0., 0., 3., 0.]);
        assert_eq!(rows[1].relation, Relation::Geq);
        assert_eq!(rows[2].coefficients, vec![1., 1., 1., 0., 0., 0., 0.]);
        assert_eq!(rows[2].relation, Relation::Eq);

        let objective = model.objective().unwrap();
        assert_eq!(objective.sense, ObjectiveSense::Maximize);
        assert_eq!(objective.coefficients, vec![4., 2., 1., -1., -1., -1., -1.]);
        assert!(model.accumulator().is_clear());
    }

    #[test]
    fn bad_relation() {
        let data = r#"{"notations": {"x": {}},
            "constraints": [{"coefficients": [{"name": "x", "value": 1}], "rhs": 1, "relation": "<>"}]}"#;
        match Model::from_json_str(data) {
            Err(JsonError::Model(ModelError::InvalidRelation(relation))) => assert_eq!(relation, "<>"),
            other => panic!("Invalid relation not caught: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn mixed_constraint() {
        let data = r#"{"notations": {"x": {}},
            "constraints": [{"coefficients": [{"name": "x", "value": 1}], "matrices": {"x": 1},
                             "rhs": 1, "relation": "<="}]}"#;
        assert!(matches!(
            Model::from_json_str(data),
            Err(JsonError::MixedConstraint(0))
        ));
    }

    #[test]
    fn unknown_notation_in_constraint() {
        let data = r#"{"notations": {"x": {}},
            "constraints": [{"matrices": {"q": 1}, "rhs": 1, "relation": "<="}]}"#;
        assert!(matches!(
            Model::from_json_str(data),
            Err(JsonError::Model(ModelError::UnknownNotation(_)))
        ));
    }

    #[test]
    fn read_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        fs::write(&model_path, EXAMPLE).unwrap();
        let model = Model::read_json(&model_path).unwrap();
        assert_eq!(model.constraints().len(), 3);

        assert!(matches!(
            Model::read_json(dir.path().join("missing.json")),
            Err(JsonError::UnableToRead(_))
        ));

        let mut values = IndexMap::new();
        values.insert("x".to_string(), array![1., 0., 0.].into_dyn());
        values.insert("y".to_string(), array![[0., 0.], [1., 0.]].into_dyn());
        let solution = ModelSolution {
            status: OptimizationStatus::Optimal,
            objective_value: 3.,
            values,
        };
        let solution_path = dir.path().join("solution.json");
        solution.write_json(&solution_path).unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(&solution_path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({
                "status": "OPTIMAL",
                "objective_value": 3.0,
                "values": {"x": [1.0, 0.0, 0.0], "y": [[0.0, 0.0], [1.0, 0.0]]}
            })
        );
    }
}
