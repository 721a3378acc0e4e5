//! Client configuration.
//!
//! Resolution order: built-in defaults, then `~/.config/ghostenergy/config.toml`,
//! then environment overrides.

use crate::paths::GhostPaths;
use ghostenergy_core::dashboard::StaleLoadPolicy;
use ghostenergy_core::error::{GhostError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides `api_base_url`.
pub const ENV_API_URL: &str = "GHOSTENERGY_API_URL";
/// Overrides `auth_base_url`.
pub const ENV_AUTH_URL: &str = "GHOSTENERGY_AUTH_URL";
/// Overrides `request_timeout_secs`.
pub const ENV_TIMEOUT_SECS: &str = "GHOSTENERGY_TIMEOUT_SECS";

/// Settings for the HTTP adapters and the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the analytics and chat endpoints
    pub api_base_url: String,
    /// Base URL of the authentication service
    pub auth_base_url: String,
    pub request_timeout_secs: u64,
    pub stale_loads: StaleLoadPolicy,
    /// Overrides the default durable storage location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8003/api".to_string(),
            auth_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            stale_loads: StaleLoadPolicy::default(),
            storage_file: None,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The storage file to use: the configured one or the platform default.
    pub fn resolve_storage_file(&self) -> Result<PathBuf> {
        match &self.storage_file {
            Some(path) => Ok(path.clone()),
            None => GhostPaths::storage_file().map_err(|e| GhostError::config(e.to_string())),
        }
    }

    /// Applies overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_AUTH_URL) {
            self.auth_base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                GhostError::config(format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECS, secs))
            })?;
        }
        Ok(self)
    }
}

/// Loads [`ClientConfig`] from disk.
pub struct ConfigService;

impl ConfigService {
    /// Loads the default config file and applies environment overrides.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load() -> Result<ClientConfig> {
        let path = GhostPaths::config_file().map_err(|e| GhostError::config(e.to_string()))?;
        Self::load_from(&path)?.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Loads a config file without applying overrides.
    pub fn load_from(path: &Path) -> Result<ClientConfig> {
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GhostError::config(format!("Failed to read {:?}: {}", path, e)))?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        toml::from_str(&content)
            .map_err(|e| GhostError::config(format!("Invalid config file {:?}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigService::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:8003/api");
        assert_eq!(config.auth_base_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base_url = \"https://energy.example.com/api\"\nstale_loads = \"discard_stale\"\n",
        )
        .unwrap();

        let config = ConfigService::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "https://energy.example.com/api");
        assert_eq!(config.stale_loads, StaleLoadPolicy::DiscardStale);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = [").unwrap();

        let err = ConfigService::load_from(&path).unwrap_err();
        assert!(matches!(err, GhostError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_AUTH_URL, "http://auth.local/api"),
            (ENV_TIMEOUT_SECS, "5"),
        ]);
        let config = ClientConfig::default()
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.auth_base_url, "http://auth.local/api");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.api_base_url, ClientConfig::default().api_base_url);
    }

    #[test]
    fn test_invalid_timeout_override() {
        let result = ClientConfig::default().apply_overrides(|key| {
            (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_storage_file_wins() {
        let config = ClientConfig {
            storage_file: Some(PathBuf::from("/tmp/ghost.json")),
            ..ClientConfig::default()
        };
        assert_eq!(config.resolve_storage_file().unwrap(), PathBuf::from("/tmp/ghost.json"));
    }
}
