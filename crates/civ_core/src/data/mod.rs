//! Data structures for the colony configuration dataset.
//!
//! This module contains pure data structures that define resources,
//! buildings, technologies and achievements. All structs are designed to be
//! deserialized from RON documents and are never mutated at runtime.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! parses documents that were already read into memory. File loading is
//! handled by `civ_tools`.

mod achievement_data;
mod building_data;
mod bundle;
mod era;
mod registry;
mod resource_data;
mod tech_data;

pub use achievement_data::{AchievementCategory, AchievementCondition, AchievementData, BuildingFilter};
pub use building_data::{BuildingData, BuildingKind, Requirement};
pub use bundle::ResourceBundle;
pub use era::Era;
pub use registry::GameData;
pub use resource_data::{ResourceCategory, ResourceData};
pub use tech_data::{Effect, TechCategory, TechData};
