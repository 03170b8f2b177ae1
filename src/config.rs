// Configuration for the playback core
//
// All sections are optional in the JSON file; missing values fall back to defaults and
// out-of-range values are clamped by `sanitized()`. Sections can live either under a
// "services" subtree or at the top level.

use std::fs;
use std::path::Path;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::logging::LoggingConfig;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

fn default_prepare_timeout_secs() -> f64 {
    20.0
}

fn default_initial_volume() -> f64 {
    1.0
}

/// Playback controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Seconds a decoder may spend preparing before PrepareTimeout (5-60)
    pub prepare_timeout_secs: f64,
    /// Start playing as soon as preparation completes
    pub auto_play_on_open: bool,
    /// Restart at the end of the stream instead of pausing
    pub loop_playback: bool,
    /// Volume applied to the decoder on construction (0-1)
    pub initial_volume: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            prepare_timeout_secs: default_prepare_timeout_secs(),
            auto_play_on_open: false,
            loop_playback: false,
            initial_volume: default_initial_volume(),
        }
    }
}

impl PlayerConfig {
    pub fn sanitized(mut self) -> Self {
        if !self.prepare_timeout_secs.is_finite() {
            self.prepare_timeout_secs = default_prepare_timeout_secs();
        }
        self.prepare_timeout_secs = self.prepare_timeout_secs.clamp(5.0, 60.0);
        if !self.initial_volume.is_finite() {
            self.initial_volume = default_initial_volume();
        }
        self.initial_volume = self.initial_volume.clamp(0.0, 1.0);
        self
    }
}

/// Remote file server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDavConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
    /// Directory listed when no path is given
    pub base_path: String,
    /// Timeout for listing and connect requests (10-60)
    pub request_timeout_secs: u64,
    /// Extra download attempts after the first one (0-3)
    pub download_retry_count: u32,
    /// Pause between download attempts
    pub retry_backoff_ms: u64,
}

impl Default for WebDavConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            username: String::new(),
            password: String::new(),
            base_path: "/".to_string(),
            request_timeout_secs: 20,
            download_retry_count: 1,
            retry_backoff_ms: 400,
        }
    }
}

impl WebDavConfig {
    pub fn sanitized(mut self) -> Self {
        self.request_timeout_secs = self.request_timeout_secs.clamp(10, 60);
        self.download_retry_count = self.download_retry_count.min(3);
        if self.base_path.trim().is_empty() {
            self.base_path = "/".to_string();
        }
        self
    }
}

/// Local media library settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory scanned for local videos and used as download target
    pub media_directory: String,
    /// Directory of the hashed file cache
    pub cache_directory: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            media_directory: "VRVideos".to_string(),
            cache_directory: "VRVideos/cache".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub player: PlayerConfig,
    pub webdav: WebDavConfig,
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Build configuration from parsed JSON, honouring the "services" subtree
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        if let Some(section) = get_service_config(value, "player") {
            config.player = serde_json::from_value(section.clone())?;
        }
        if let Some(section) = get_service_config(value, "webdav") {
            config.webdav = serde_json::from_value(section.clone())?;
        }
        if let Some(section) = get_service_config(value, "library") {
            config.library = serde_json::from_value(section.clone())?;
        }
        if let Some(section) = value.get("logging") {
            config.logging = serde_json::from_value(section.clone())?;
        }
        Ok(config.sanitized())
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Config file {:?} not found, using defaults", path);
            return AppConfig::default();
        }
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {:?}: {}", path, e);
                AppConfig::default()
            }
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.player = self.player.sanitized();
        self.webdav = self.webdav.sanitized();
        self
    }
}

/// Helper function to get a configuration section with backward compatibility
///
/// This function first tries to find the section in the "services" structure,
/// then falls back to the top-level structure.
///
/// # Example
/// ```rust
/// use serde_json::json;
/// use vrplayer::config::get_service_config;
///
/// let config = json!({
///   "services": {
///     "webdav": { "server_url": "https://dav.example.com" }
///   }
/// });
///
/// let webdav = get_service_config(&config, "webdav").unwrap();
/// assert_eq!(webdav["server_url"], "https://dav.example.com");
/// ```
pub fn get_service_config<'a>(config: &'a serde_json::Value, service_name: &str) -> Option<&'a serde_json::Value> {
    if let Some(services) = config.get("services") {
        if let Some(service_config) = services.get(service_name) {
            debug!("Found {} configuration in services section", service_name);
            return Some(service_config);
        }
    }

    if let Some(service_config) = config.get(service_name) {
        debug!("Found {} configuration at top level", service_name);
        return Some(service_config);
    }

    debug!("No {} configuration found", service_name);
    None
}
