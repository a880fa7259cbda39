//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::tmdb::{CatalogSettings, DEFAULT_API_BASE, DEFAULT_IMAGE_BASE, DEFAULT_PROXY_URL};

const APP_DIR: &str = "cineview";

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tmdb_api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_image_base")]
    pub image_base_url: String,
    #[serde(default = "default_proxy")]
    pub proxy_url: String,
    // Empty means TMDB's default
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub preferred_server: String,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    // Start playback when the server, season or episode changes
    #[serde(default)]
    pub autoplay: bool,
    // Empty uses the platform opener
    #[serde(default)]
    pub browser_command: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_image_base() -> String {
    DEFAULT_IMAGE_BASE.to_string()
}

fn default_proxy() -> String {
    DEFAULT_PROXY_URL.to_string()
}

fn default_font_size() -> u32 {
    14
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: String::new(),
            api_base_url: default_api_base(),
            image_base_url: default_image_base(),
            proxy_url: default_proxy(),
            language: String::new(),
            preferred_server: String::new(),
            dark_mode: true,
            autoplay: false,
            browser_command: String::new(),
            font_size: 14,
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push("config.json");
        path
    }

    /// Directory holding the persisted lists
    pub fn data_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Missing or malformed files give the defaults
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring malformed config {}: {}", path.display(), e),
                }
            }
        }

        Self::default()
    }

    pub fn save(&self) {
        self.save_to(&Self::config_path());
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    log::error!("Failed to save config: {}", e);
                }
            }
            Err(e) => log::error!("Failed to encode config: {}", e),
        }
    }

    /// Configured key, or the environment variable
    pub fn api_key(&self) -> String {
        let key = self.tmdb_api_key.trim();
        if !key.is_empty() {
            return key.to_string();
        }
        std::env::var(API_KEY_ENV)
            .map(|k| k.trim().to_string())
            .unwrap_or_default()
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        let mut settings = CatalogSettings::new(&self.api_key());
        if !self.api_base_url.trim().is_empty() {
            settings.api_base = self.api_base_url.trim().to_string();
        }
        if !self.proxy_url.trim().is_empty() {
            settings.proxy_url = self.proxy_url.trim().to_string();
        }
        let lang = self.language.trim();
        settings.language = (!lang.is_empty()).then(|| lang.to_string());
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"preferred_server": "Alpha", "dark_mode": false}"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.preferred_server, "Alpha");
        assert!(!config.dark_mode);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.proxy_url, DEFAULT_PROXY_URL);
        assert_eq!(config.font_size, 14);
    }

    #[test]
    fn test_malformed_or_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(AppConfig::load_from(&path).font_size, 14);

        fs::write(&path, "{{{").unwrap();
        assert!(AppConfig::load_from(&path).dark_mode);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            language: "de".to_string(),
            autoplay: true,
            ..Default::default()
        };
        config.save_to(&path);

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.language, "de");
        assert!(loaded.autoplay);
    }

    #[test]
    fn test_catalog_settings() {
        let config = AppConfig {
            tmdb_api_key: " abc ".to_string(),
            language: "fr".to_string(),
            proxy_url: "https://relay.test/raw".to_string(),
            ..Default::default()
        };
        let settings = config.catalog_settings();
        assert_eq!(settings.api_key, "abc");
        assert_eq!(settings.language.as_deref(), Some("fr"));
        assert_eq!(settings.proxy_url, "https://relay.test/raw");
        assert_eq!(settings.api_base, DEFAULT_API_BASE);

        let config = AppConfig { tmdb_api_key: "abc".into(), ..Default::default() };
        assert_eq!(config.catalog_settings().language, None);
    }
}
