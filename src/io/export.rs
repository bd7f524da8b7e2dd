//! Export the trial history to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! analysis scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ResponseRecord;
use crate::error::AppError;

/// Write the trial history to a CSV file.
pub fn write_history_csv(path: &Path, history: &[ResponseRecord]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::io(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "trial,frequency_cpd,contrast,required_sensitivity,detected")
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for (i, record) in history.iter().enumerate() {
        writeln!(
            file,
            "{},{:.10},{:.10},{:.10},{}",
            i + 1,
            record.stimulus.frequency,
            record.stimulus.contrast,
            record.stimulus.required_sensitivity(),
            record.detected,
        )
        .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
