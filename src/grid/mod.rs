//! Discretized stimulus and parameter spaces.
//!
//! Responsibilities:
//!
//! - build geometric (log-spaced) axes with validated bounds
//! - expose the contrast x frequency stimulus space with flattened addressing
//! - expose the four-dimensional parameter grid and the index <-> real-unit
//!   mapping used by the estimator

pub mod axis;
pub mod params;
pub mod stimulus;

pub use axis::*;
pub use params::*;
pub use stimulus::*;
