//! Save slot backed by a file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use civ_core::error::{GameError, Result};
use civ_core::save::SaveSlot;

/// A save slot stored at a single path.
///
/// Writes go to a sibling temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Create a slot for `path`. Nothing is touched until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the save.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, e: &std::io::Error) -> GameError {
        GameError::SaveSlot(format!("{}: {e}", self.path.display()))
    }
}

impl SaveSlot for FileSlot {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.error(&e)),
        }
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error(&e))?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents).map_err(|e| self.error(&e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.error(&e))
    }

    fn delete(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(&e)),
        }
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slot_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut slot = FileSlot::new(dir.path().join("saves/colony.json"));

        assert!(!slot.exists());
        assert_eq!(slot.read().unwrap(), None);

        slot.write("{\"v\":2}").unwrap();
        assert!(slot.exists());
        assert_eq!(slot.read().unwrap().as_deref(), Some("{\"v\":2}"));

        slot.delete().unwrap();
        slot.delete().unwrap();
        assert!(!slot.exists());
    }

    #[test]
    fn test_colony_save_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut slot = FileSlot::new(dir.path().join("colony.json"));

        let mut colony = civ_test_utils::fixtures::established_colony();
        colony.save(&mut slot, 1_000).unwrap();

        let mut loaded = civ_test_utils::fixtures::new_colony();
        loaded.load(&slot, 2_000).unwrap();
        assert_eq!(loaded.construction().len(), colony.construction().len());
        assert!(loaded.research().is_researched("fire"));
    }
}
