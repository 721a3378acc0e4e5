//! Unified path management for GhostEnergy client files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/ghostenergy/       # Config directory
//! ├── config.toml              # Client configuration
//! └── storage.json             # Durable key/value storage (token, user profile)
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "ghostenergy";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution for the client's local files.
pub struct GhostPaths;

impl GhostPaths {
    /// Returns the GhostEnergy configuration directory (e.g. `~/.config/ghostenergy/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the durable key/value storage file.
    ///
    /// # Security Note
    ///
    /// The file holds the auth token; the JSON store restricts it to the
    /// owner (600) on Unix.
    pub fn storage_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("storage.json"))
    }
}
