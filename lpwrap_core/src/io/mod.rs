//! Module for reading model definitions and writing solutions
pub mod json;
