//! Error types for the colony simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors that cross a boundary.
///
/// Gameplay precondition failures (cannot afford, locked technology, ...) are
/// not represented here; they live in [`crate::buildings::ConstructionError`]
/// and [`crate::research::ResearchError`] and are expected outcomes.
#[derive(Debug, Error)]
pub enum GameError {
    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the document that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Configuration dataset failed validation.
    #[error("Game data failed validation with {} problem(s): {}", .0.len(), .0.join("; "))]
    InvalidGameData(Vec<String>),

    /// Save document could not be parsed.
    #[error("Failed to parse save data: {0}")]
    SaveParse(String),

    /// Save document was written by a newer or unknown schema.
    #[error("Unsupported save version {found} (this build reads up to {supported})")]
    UnsupportedSaveVersion {
        /// Schema version found in the document.
        found: u32,
        /// Newest schema version this build understands.
        supported: u32,
    },

    /// Save document could not be encoded.
    #[error("Failed to encode save data: {0}")]
    SaveEncode(String),

    /// Save slot storage failed.
    #[error("Save slot error: {0}")]
    SaveSlot(String),

    /// No save present in the slot.
    #[error("No save found")]
    NoSave,

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
