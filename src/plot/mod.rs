//! Terminal plotting of the estimated CSF.

pub mod ascii;

pub use ascii::*;
