//! # Civ Development Tools
//!
//! Command-line tools for development:
//! - Data validators
//! - Headless scripted simulation
//! - Save inspection and offline previews
//!
//! All file IO of the workspace lives here; `civ_core` never touches the
//! filesystem.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod data_loader;
pub mod script;
pub mod slot;
pub mod validate;
