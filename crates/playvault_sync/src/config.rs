use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Environment variable that overrides the configured search API key.
pub const API_KEY_ENV: &str = "PLAYVAULT_YOUTUBE_API_KEY";

const CONFIG_EXTENSION: &str = "json";

/// Client settings. Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub page_size: usize,
    pub search_max_results: usize,
    pub playlists_collection: String,
    pub users_collection: String,
    pub youtube_api_base: String,
    pub youtube_api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_size: 8,
            search_max_results: 5,
            playlists_collection: "playlists".to_string(),
            users_collection: "users".to_string(),
            youtube_api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            youtube_api_key: None,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Save as pretty-printed JSON. Appends `.json` if the path has no
    /// extension.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: ClientConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults; then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.youtube_api_key = Some(key.trim().to_string());
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SyncError::Config("pageSize must be at least 1".into()));
        }
        if self.youtube_api_base.trim().is_empty() {
            return Err(SyncError::Config("youtubeApiBase must not be empty".into()));
        }
        if self.playlists_collection.is_empty() || self.users_collection.is_empty() {
            return Err(SyncError::Config("collection names must not be empty".into()));
        }
        Ok(())
    }
}

fn ensure_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(CONFIG_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.json");
        let config = ClientConfig {
            page_size: 12,
            youtube_api_key: Some("k".to_string()),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(ClientConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn extension_appended_if_missing() {
        let dir = TempDir::new().unwrap();
        ClientConfig::default()
            .save_to_file(dir.path().join("client"))
            .unwrap();
        assert!(dir.path().join("client.json").exists());
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"pageSize": 4}"#).unwrap();
        let config = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(config.page_size, 4);
        assert_eq!(config.search_max_results, 5);
        assert_eq!(config.playlists_collection, "playlists");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"pageSize": 0}"#).unwrap();
        assert!(matches!(
            ClientConfig::load_from_file(&path),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ClientConfig::load_from_file("/tmp/does_not_exist_playvault.json").is_err());
    }
}
