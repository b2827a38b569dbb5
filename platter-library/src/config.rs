//! Simple configuration persistence for Platter
//!
//! A flat `key=value` file. The library only interprets `music_folder`;
//! every other key is kept verbatim for the crates that own it (deck
//! tuning lives in `platter-audio`).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    /// Folder scanned for tracks
    pub music_folder: Option<PathBuf>,
    /// Remaining settings, keyed by name
    settings: BTreeMap<String, String>,
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be read.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("platter")
            .join("config.txt")
    }

    /// Raw value for a setting
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Parsed value for a setting.
    ///
    /// Missing keys yield `None` quietly; present but unparsable values are
    /// logged and also yield `None`, so callers keep their default.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, value = raw, "ignoring unparsable setting");
                None
            }
        }
    }

    /// Set a setting, replacing any previous value
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.settings.insert(key.to_string(), value.to_string());
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "music_folder" => {
                    if !value.is_empty() {
                        config.music_folder = Some(PathBuf::from(value));
                    }
                }
                _ if !key.is_empty() => {
                    config.settings.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let mut lines = vec!["# Platter Configuration".to_string()];

        if let Some(ref folder) = self.music_folder {
            lines.push(format!("music_folder={}", folder.display()));
        }
        for (key, value) in &self.settings {
            lines.push(format!("{}={}", key, value));
        }

        lines.join("\n")
    }
}
