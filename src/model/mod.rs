//! Psychophysical models: CSF shape and detection probability.

pub mod csf;
pub mod psychometric;

pub use csf::*;
pub use psychometric::*;
