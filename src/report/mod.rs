//! Reporting utilities: formatted terminal output for finished sessions.
//!
//! We keep formatting code in one place so:
//! - the estimator/math code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

pub mod format;

pub use format::*;
