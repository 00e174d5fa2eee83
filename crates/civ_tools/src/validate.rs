//! Data validation utilities.

use std::path::Path;

use crate::data_loader::{data_files, load_data_directory, ToolResult};

/// Outcome of validating a data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Documents that were read.
    pub files: usize,
    /// Definitions per table: resources, buildings, technologies,
    /// achievements.
    pub counts: [usize; 4],
    /// Every cross-reference problem found.
    pub problems: Vec<String>,
}

impl ValidationReport {
    /// Whether the dataset is consistent.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Validate all RON data files in a directory.
///
/// Parse failures are errors; reference problems are collected in the
/// report.
///
/// # Errors
///
/// Returns an error if the directory or any file cannot be read or parsed.
pub fn validate_data_directory(path: &Path) -> ToolResult<ValidationReport> {
    let files = data_files(path)?.len();
    let data = load_data_directory(path)?;
    Ok(ValidationReport {
        files,
        counts: [
            data.resources().count(),
            data.buildings().count(),
            data.technology_count(),
            data.achievement_count(),
        ],
        problems: data.validate(),
    })
}
