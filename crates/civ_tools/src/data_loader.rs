//! Dataset and configuration loading.
//!
//! A data directory holds any number of `.ron` documents, each a
//! `GameData(...)` with some subset of the tables. They are merged in file
//! name order, so later files override earlier ones by ID.

use std::fs;
use std::path::{Path, PathBuf};

use civ_core::config::EngineConfig;
use civ_core::data::GameData;
use civ_core::error::GameError;
use thiserror::Error;

/// Error type for tool file operations.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Directory not found.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    /// Failed to read or write a file.
    #[error("IO error on '{0}': {1}")]
    Io(String, String),
    /// The engine rejected a document.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Failed to parse a script.
    #[error("Failed to parse script '{0}': {1}")]
    Script(String, String),
}

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

fn read(path: &Path) -> ToolResult<String> {
    fs::read_to_string(path).map_err(|e| ToolError::Io(path.display().to_string(), e.to_string()))
}

/// Load one dataset document.
///
/// # Errors
///
/// Returns an IO or parse error.
pub fn load_data_file(path: &Path) -> ToolResult<GameData> {
    let text = read(path)?;
    Ok(GameData::from_ron_str(&path.display().to_string(), &text)?)
}

/// List the `.ron` files of a directory in name order.
///
/// # Errors
///
/// Returns an error if the directory is missing or unreadable.
pub fn data_files(dir: &Path) -> ToolResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ToolError::DirectoryNotFound(dir.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).map_err(|e| ToolError::Io(dir.display().to_string(), e.to_string()))?
    {
        let entry = entry.map_err(|e| ToolError::Io(dir.display().to_string(), e.to_string()))?;
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load and merge every dataset document in a directory, without
/// validating cross-references.
///
/// # Errors
///
/// Returns the first IO or parse error.
pub fn load_data_directory(dir: &Path) -> ToolResult<GameData> {
    let mut data = GameData::new();
    for path in data_files(dir)? {
        tracing::debug!("Loading {}", path.display());
        data.extend(load_data_file(&path)?);
    }
    Ok(data)
}

/// Load a directory and reject datasets with dangling references.
///
/// # Errors
///
/// Returns a load error, or [`GameError::InvalidGameData`] listing every
/// problem.
pub fn load_validated_directory(dir: &Path) -> ToolResult<GameData> {
    let data = load_data_directory(dir)?;
    let problems = data.validate();
    if problems.is_empty() {
        Ok(data)
    } else {
        Err(GameError::InvalidGameData(problems).into())
    }
}

/// Load an engine configuration, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns an IO or parse error.
pub fn load_config(path: Option<&Path>) -> ToolResult<EngineConfig> {
    match path {
        Some(path) => {
            let text = read(path)?;
            Ok(EngineConfig::from_ron_str(&path.display().to_string(), &text)?)
        }
        None => Ok(EngineConfig::default()),
    }
}
