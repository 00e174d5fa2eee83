//! Player save codec.
//!
//! Saves are JSON documents with a schema version:
//!
//! - **Version 1**: the verbose camelCase layout (`version`, `gameState`,
//!   `buildings[].buildingId`, ...). Read-only; migrated on load.
//! - **Version 2**: the compact short-keyed layout written today (`v`, `c`,
//!   `l`, `g`, `r`, `b`, `t`, `a`). Resource amounts at or below 0.01 are
//!   omitted and the rest are floored to one decimal; achievements are only
//!   written once unlocked or in progress.
//!
//! Transient timestamps are not saved: in-progress construction restarts
//! at load, in-progress research resumes from its saved percentage.
//!
//! This is distinct from [`crate::simulation::Colony::snapshot`], which
//! captures the full state (timers included) with `bincode`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buildings::BuildingStatus;
use crate::data::Era;
use crate::error::{GameError, Result};
use crate::research::TechStatus;

/// Schema version written by this build.
pub const SAVE_VERSION: u32 = 2;

/// Stockpiles at or below this are not written.
const MIN_SAVED_AMOUNT: f64 = 0.01;

/// Compact player save (schema version 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Schema version.
    #[serde(rename = "v")]
    pub version: u32,
    /// Wall-clock ms the colony was founded.
    #[serde(rename = "c")]
    pub created_at: u64,
    /// Wall-clock ms of this save.
    #[serde(rename = "l")]
    pub last_saved: u64,
    /// Clock and population.
    #[serde(rename = "g")]
    pub game: SavedGame,
    /// Sparse stockpiles.
    #[serde(rename = "r", default)]
    pub resources: BTreeMap<String, f64>,
    /// Building instances.
    #[serde(rename = "b", default)]
    pub buildings: Vec<SavedBuilding>,
    /// Technology instances.
    #[serde(rename = "t", default)]
    pub technologies: Vec<SavedTechnology>,
    /// Unlocked or in-progress achievements.
    #[serde(rename = "a", default)]
    pub achievements: Vec<SavedAchievement>,
}

/// Clock state in a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    /// Current era.
    #[serde(rename = "e")]
    pub era: Era,
    /// Game time in seconds.
    #[serde(rename = "t")]
    pub game_time: f64,
    /// Population.
    #[serde(rename = "p")]
    pub population: SavedPopulation,
    /// Wall-clock ms the colony was last played.
    #[serde(rename = "lp")]
    pub last_play_time: u64,
}

/// Population in a save.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedPopulation {
    /// Current population (floored).
    #[serde(rename = "c")]
    pub current: f64,
    /// Population limit.
    #[serde(rename = "m")]
    pub max: f64,
    /// Effective growth rate at save time (informational).
    #[serde(rename = "g", default)]
    pub growth_rate: f64,
}

/// Building instance in a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBuilding {
    /// Building ID.
    #[serde(rename = "i")]
    pub id: String,
    /// Level.
    #[serde(rename = "l")]
    pub level: u32,
    /// Status.
    #[serde(rename = "s")]
    pub status: BuildingStatus,
}

/// Technology instance in a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTechnology {
    /// Technology ID.
    #[serde(rename = "i")]
    pub id: String,
    /// Status.
    #[serde(rename = "s")]
    pub status: TechStatus,
    /// Progress percentage, omitted when zero.
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// Achievement instance in a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAchievement {
    /// Achievement ID.
    #[serde(rename = "i")]
    pub id: String,
    /// Unlock flag.
    #[serde(rename = "u")]
    pub unlocked: bool,
    /// Progress percentage, omitted when zero.
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// Round a stockpile for saving (`None` = omit).
#[must_use]
pub fn compact_amount(amount: f64) -> Option<f64> {
    (amount > MIN_SAVED_AMOUNT).then(|| (amount * 10.0).floor() / 10.0)
}

/// Round a percentage for saving (`None` = omit).
#[must_use]
pub fn compact_progress(progress: f64) -> Option<f64> {
    (progress > 0.0).then(|| (progress * 100.0).floor() / 100.0)
}

impl SaveData {
    /// Encode as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveEncode`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::SaveEncode(e.to_string()))
    }

    /// Decode any supported schema version, migrating older layouts.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveParse`] for malformed documents and
    /// [`GameError::UnsupportedSaveVersion`] for unknown versions.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| GameError::SaveParse(e.to_string()))?;
        migrate(value)
    }
}

/// Schema version of a raw save document.
fn detect_version(value: &Value) -> Result<u32> {
    if let Some(tag) = value.get("v") {
        return match tag {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| GameError::SaveParse(format!("invalid version tag {n}"))),
            // Compact saves written before numeric versioning carry a
            // release string.
            Value::String(_) => Ok(2),
            _ => Err(GameError::SaveParse("invalid version tag".to_string())),
        };
    }
    if value.get("version").is_some() {
        return Ok(1);
    }
    Err(GameError::SaveParse("missing version tag".to_string()))
}

/// Upgrade a raw save document to the current schema.
///
/// # Errors
///
/// Returns [`GameError::UnsupportedSaveVersion`] for versions newer than
/// [`SAVE_VERSION`] and [`GameError::SaveParse`] if the document does not
/// match its declared layout.
pub fn migrate(mut value: Value) -> Result<SaveData> {
    let version = detect_version(&value)?;
    match version {
        1 => {
            tracing::warn!("Migrating version 1 save to version {SAVE_VERSION}");
            let legacy: LegacySave =
                serde_json::from_value(value).map_err(|e| GameError::SaveParse(e.to_string()))?;
            Ok(legacy.into())
        }
        SAVE_VERSION => {
            if let Some(tag) = value.get_mut("v") {
                if tag.is_string() {
                    tracing::warn!("Save carries a release tag; treating as version {SAVE_VERSION}");
                    *tag = Value::from(SAVE_VERSION);
                }
            }
            serde_json::from_value(value).map_err(|e| GameError::SaveParse(e.to_string()))
        }
        found => Err(GameError::UnsupportedSaveVersion {
            found,
            supported: SAVE_VERSION,
        }),
    }
}

// ============================================================================
// Version 1 layout
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySave {
    #[serde(default)]
    created_at: u64,
    #[serde(default)]
    last_saved: u64,
    game_state: LegacyGameState,
    #[serde(default)]
    resources: BTreeMap<String, f64>,
    #[serde(default)]
    buildings: Vec<LegacyBuilding>,
    #[serde(default)]
    technologies: Vec<LegacyTechnology>,
    #[serde(default)]
    achievements: Vec<LegacyAchievement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyGameState {
    current_era: Era,
    #[serde(default)]
    game_time: f64,
    population: LegacyPopulation,
    #[serde(default)]
    last_play_time: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPopulation {
    current: f64,
    max: f64,
    #[serde(default)]
    growth_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBuilding {
    building_id: String,
    level: u32,
    status: BuildingStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTechnology {
    technology_id: String,
    status: TechStatus,
    #[serde(default)]
    research_progress: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyAchievement {
    achievement_id: String,
    unlocked: bool,
    #[serde(default)]
    progress: Option<f64>,
}

impl From<LegacySave> for SaveData {
    fn from(legacy: LegacySave) -> Self {
        let game = legacy.game_state;
        Self {
            version: SAVE_VERSION,
            created_at: legacy.created_at,
            last_saved: legacy.last_saved,
            game: SavedGame {
                era: game.current_era,
                game_time: game.game_time,
                population: SavedPopulation {
                    current: game.population.current.floor(),
                    max: game.population.max,
                    growth_rate: game.population.growth_rate,
                },
                last_play_time: game.last_play_time,
            },
            resources: legacy
                .resources
                .into_iter()
                .filter_map(|(id, amount)| compact_amount(amount).map(|a| (id, a)))
                .collect(),
            buildings: legacy
                .buildings
                .into_iter()
                .map(|b| SavedBuilding {
                    id: b.building_id,
                    level: b.level,
                    status: b.status,
                })
                .collect(),
            technologies: legacy
                .technologies
                .into_iter()
                .map(|t| SavedTechnology {
                    id: t.technology_id,
                    status: t.status,
                    progress: t.research_progress.and_then(compact_progress),
                })
                .collect(),
            achievements: legacy
                .achievements
                .into_iter()
                .filter(|a| a.unlocked || a.progress.is_some_and(|p| p > 0.0))
                .map(|a| SavedAchievement {
                    id: a.achievement_id,
                    unlocked: a.unlocked,
                    progress: a.progress.and_then(compact_progress),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Save slots
// ============================================================================

/// Storage for a single save document.
pub trait SaveSlot {
    /// Read the stored document, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveSlot`] if the storage cannot be read.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveSlot`] if the storage cannot be written.
    fn write(&mut self, contents: &str) -> Result<()>;

    /// Remove the stored document. Removing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveSlot`] if the storage cannot be modified.
    fn delete(&mut self) -> Result<()>;

    /// Whether a document is stored.
    fn exists(&self) -> bool;
}

/// In-memory save slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Option<String>,
}

impl MemorySlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.contents = None;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.contents.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"{
        "version": "0.1.0-alpha",
        "createdAt": 1000,
        "lastSaved": 5000,
        "gameState": {
            "currentEra": "bronze",
            "gameTime": 120.5,
            "population": {"current": 12.7, "max": 25, "growthRate": 0.0167},
            "lastPlayTime": 4000,
            "lastSaveTime": 5000
        },
        "resources": {"food": 123.456, "wood": 0.001},
        "buildings": [{"buildingId": "camp", "level": 2, "status": "built", "buildStartTime": 10}],
        "technologies": [{"technologyId": "fire", "status": "researching", "researchProgress": 42.123}],
        "achievements": [
            {"achievementId": "first_step", "unlocked": true, "progress": 100},
            {"achievementId": "hoarder", "unlocked": false, "progress": 0}
        ]
    }"#;

    #[test]
    fn test_compact_amount() {
        assert_eq!(compact_amount(0.005), None);
        assert_eq!(compact_amount(123.456), Some(123.4));
    }

    #[test]
    fn test_migrate_legacy_layout() {
        let save = SaveData::from_json(LEGACY).unwrap();
        assert_eq!(save.version, SAVE_VERSION);
        assert_eq!(save.game.era, Era::Bronze);
        assert_eq!(save.game.population.current, 12.0);
        assert_eq!(save.resources.get("food"), Some(&123.4));
        assert!(!save.resources.contains_key("wood"));
        assert_eq!(save.buildings[0].status, BuildingStatus::Built);
        assert_eq!(save.technologies[0].progress, Some(42.12));
        assert_eq!(save.achievements.len(), 1);
    }

    #[test]
    fn test_compact_keys_on_disk() {
        let save = SaveData::from_json(LEGACY).unwrap();
        let json = save.to_json().unwrap();
        assert!(json.contains(r#""v":2"#));
        assert!(json.contains(r#""lp":4000"#));
        assert!(json.contains(r#""s":"researching""#));
        assert_eq!(SaveData::from_json(&json).unwrap(), save);
    }

    #[test]
    fn test_release_string_tag_reads_as_compact() {
        let json = r#"{"v":"0.1.0-alpha","c":1,"l":2,
            "g":{"e":"stone","t":3.0,"p":{"c":10,"m":20,"g":0.01},"lp":2},
            "r":{},"b":[],"t":[],"a":[]}"#;
        let save = SaveData::from_json(json).unwrap();
        assert_eq!(save.version, SAVE_VERSION);
        assert_eq!(save.game.game_time, 3.0);
    }

    #[test]
    fn test_missing_sections_default() {
        let json = r#"{"v":2,"c":1,"l":2,
            "g":{"e":"stone","t":0.0,"p":{"c":10,"m":20},"lp":2}}"#;
        let save = SaveData::from_json(json).unwrap();
        assert!(save.buildings.is_empty());
        assert!(save.technologies.is_empty());
    }

    #[test]
    fn test_future_version_rejected() {
        let err = SaveData::from_json(r#"{"v": 9}"#).unwrap_err();
        assert!(matches!(
            err,
            GameError::UnsupportedSaveVersion {
                found: 9,
                supported: SAVE_VERSION
            }
        ));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            SaveData::from_json("not json"),
            Err(GameError::SaveParse(_))
        ));
        assert!(matches!(
            SaveData::from_json("{}"),
            Err(GameError::SaveParse(_))
        ));
    }

    #[test]
    fn test_memory_slot() {
        let mut slot = MemorySlot::new();
        assert!(!slot.exists());
        slot.write("abc").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("abc"));
        slot.delete().unwrap();
        slot.delete().unwrap();
        assert!(!slot.exists());
    }
}
