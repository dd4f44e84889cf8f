use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

use super::alerts::model::CooldownMode;

/// Application settings, persisted as settings.json.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// JSON station catalog used to resolve destinations by name
    #[serde(default = "default_stations_file")]
    pub stations_file: PathBuf,
    /// Where emergency contact books are stored
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Audio played when an alert fires; silent when unset
    #[serde(default)]
    pub sound_file: Option<PathBuf>,
    /// Fallback poll cadence in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub cooldown_mode: CooldownMode,
    /// User whose contacts receive arrival texts, if any
    #[serde(default)]
    pub notify_user: Option<String>,
}

fn default_stations_file() -> PathBuf {
    PathBuf::from("stations.json")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        // A zero interval would spin the fallback poll.
        Duration::from_millis(self.poll_interval_ms.max(100))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stations_file: default_stations_file(),
            data_dir: default_data_dir(),
            sound_file: None,
            poll_interval_ms: default_poll_interval_ms(),
            cooldown_mode: CooldownMode::Standard,
            notify_user: None,
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("settings.json"),
        }
    }

    /// Load settings, falling back to defaults when missing or unreadable.
    pub fn load(&self) -> Settings {
        if !self.config_path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(&self.config_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Invalid settings in {:?}, using defaults: {}", self.config_path, e);
                Settings::default()
            }),
            Err(e) => {
                log::warn!("Failed to read {:?}, using defaults: {}", self.config_path, e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().to_path_buf());

        let default = manager.load();
        assert_eq!(default, Settings::default());
        assert_eq!(default.poll_interval(), Duration::from_secs(1));

        let new_settings = Settings {
            stations_file: PathBuf::from("/tmp/stations.json"),
            sound_file: Some(PathBuf::from("/tmp/sound.mp3")),
            poll_interval_ms: 2000,
            cooldown_mode: CooldownMode::Legacy,
            ..Settings::default()
        };

        manager.save(&new_settings).unwrap();
        assert_eq!(manager.load(), new_settings);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), r#"{"poll_interval_ms": 0}"#).unwrap();
        let settings = ConfigManager::new(dir.path().to_path_buf()).load();

        assert_eq!(settings.stations_file, PathBuf::from("stations.json"));
        assert_eq!(settings.cooldown_mode, CooldownMode::Standard);
        assert_eq!(settings.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "{{{").unwrap();
        assert_eq!(ConfigManager::new(dir.path().to_path_buf()).load(), Settings::default());
    }
}
