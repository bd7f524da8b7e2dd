//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration (`StimulusConfig`, `ParamGridConfig`, `RunConfig`)
//! - trial-level records (`Stimulus`, `ResponseRecord`)
//! - estimator outputs (`CsfParams`, `ParameterEstimate`)
//! - the session JSON schema (`SessionFile`)

pub mod types;

pub use types::*;
