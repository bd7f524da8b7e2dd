//! The Bayesian active-sampling estimator.
//!
//! Responsibilities:
//!
//! - maintain the posterior over the parameter grid
//! - select the next stimulus by expected information gain (parallel scan)
//! - ingest responses via Bayes' rule and keep the trial history

pub mod core;
pub mod entropy;

pub use core::*;
pub use entropy::*;
