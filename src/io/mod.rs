//! Session persistence: JSON session files and CSV history exports.

pub mod export;
pub mod session;
