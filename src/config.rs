//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution, plus the
//! [`SettingsStore`] that hands the active configuration to the rest of the
//! program.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use crate::constants::{CACHE_DIR_NAME, CONFIG_DIR_ENV, CONFIG_DIR_NAME};
use crate::models::{FilterDictionary, RgbColor};
use crate::services::EditOptions;

/// File system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// External converter executable
    pub converter_tool: Option<PathBuf>,
    /// Mapping/schema file handed to the converter
    pub mapping_file: Option<PathBuf>,
    /// Conversion cache directory (defaults to the system temp dir)
    pub cache_dir: Option<PathBuf>,
}

/// Batch conversion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Worker threads (0 uses the processor count)
    pub workers: usize,
    /// Per-unit timeout in seconds (0 disables it)
    pub unit_timeout_secs: u64,
    /// Whether conversions consult the cache
    pub use_cache: bool,
    /// Clear the cache before every batch
    pub auto_clear_cache: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            unit_timeout_secs: 300,
            use_cache: true,
            auto_clear_cache: false,
        }
    }
}

impl ConversionConfig {
    /// Timeout as a duration, if enabled.
    pub fn unit_timeout(&self) -> Option<Duration> {
        (self.unit_timeout_secs > 0).then(|| Duration::from_secs(self.unit_timeout_secs))
    }
}

/// Defaults for the editing operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingConfig {
    /// Keep each parameter's brightness when recoloring
    pub preserve_intensity: bool,
    /// Leave grayscale parameters untouched
    pub ignore_grayscale: bool,
    /// Snapshots kept for undo (0 keeps all)
    pub history_limit: usize,
    /// Hex colors used by shuffle
    pub shuffle_palette: Vec<String>,
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            preserve_intensity: true,
            ignore_grayscale: true,
            history_limit: 0,
            shuffle_palette: vec![
                "#ccffff".to_string(),
                "#88eeee".to_string(),
                "#66dddd".to_string(),
            ],
        }
    }
}

impl EditingConfig {
    /// Edit switches derived from these settings.
    pub fn edit_options(&self) -> EditOptions {
        EditOptions {
            preserve_intensity: self.preserve_intensity,
            ignore_grayscale: self.ignore_grayscale,
        }
    }

    /// Parsed shuffle palette.
    pub fn palette(&self) -> Result<Vec<RgbColor>> {
        self.shuffle_palette
            .iter()
            .map(|hex| RgbColor::from_hex(hex))
            .collect()
    }
}

/// Application configuration.
///
/// Stored at `<config dir>/rvfxe/config.toml`:
/// - Linux: `~/.config/rvfxe/config.toml`
/// - macOS: `~/Library/Application Support/rvfxe/config.toml`
/// - Windows: `%APPDATA%\rvfxe\config.toml`
///
/// The `RVFXE_CONFIG_DIR` environment variable replaces the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Batch conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// Parameter name filter
    #[serde(default)]
    pub filter: FilterDictionary,
    /// Editing defaults
    #[serde(default)]
    pub editing: EditingConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the config directory path, honoring `RVFXE_CONFIG_DIR`.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from an explicit file.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to an explicit file using temp file + rename.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = config_path.with_extension("toml.tmp");
        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    ///
    /// Checks:
    /// - configured paths are not empty
    /// - every shuffle palette entry is a hex color
    /// - the worker count is sane
    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("converter_tool", &self.paths.converter_tool),
            ("mapping_file", &self.paths.mapping_file),
            ("cache_dir", &self.paths.cache_dir),
        ];
        for (name, path) in paths {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                anyhow::bail!("paths.{name} must not be empty");
            }
        }

        self.editing
            .palette()
            .context("Invalid editing.shuffle_palette")?;

        if self.conversion.workers > 256 {
            anyhow::bail!(
                "conversion.workers must be at most 256 (got {})",
                self.conversion.workers
            );
        }

        Ok(())
    }

    /// Effective cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.paths
            .cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(CACHE_DIR_NAME))
    }
}

type Hook = Box<dyn Fn(&Config) + Send + Sync>;

/// Shared, observable holder of the active configuration.
///
/// Components receive the store explicitly rather than reading global state.
/// Every change runs the subscribed hooks with the new configuration.
pub struct SettingsStore {
    config: RwLock<Config>,
    hooks: Mutex<Vec<Hook>>,
}

impl SettingsStore {
    /// Creates a store holding `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
            hooks: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> Config {
        self.config.read().unwrap().clone()
    }

    /// Replaces the configuration after validating it.
    pub fn set(&self, config: Config) -> Result<()> {
        config.validate()?;
        *self.config.write().unwrap() = config;
        self.notify();
        Ok(())
    }

    /// Edits the configuration in place. Invalid results are rejected and
    /// the previous configuration kept.
    pub fn update(&self, edit: impl FnOnce(&mut Config)) -> Result<()> {
        let mut next = self.get();
        edit(&mut next);
        self.set(next)
    }

    /// Registers a hook run after every change.
    pub fn subscribe(&self, hook: impl Fn(&Config) + Send + Sync + 'static) {
        self.hooks.lock().unwrap().push(Box::new(hook));
    }

    fn notify(&self) {
        let current = self.get();
        for hook in self.hooks.lock().unwrap().iter() {
            hook(&current);
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
