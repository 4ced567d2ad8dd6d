//! Core rust implementation of lpwrap, a declarative modeling layer for linear and
//! mixed integer programs built from named, shaped groups of decision variables.

pub mod configuration;
pub mod io;
pub mod logging;
pub mod optimize;
