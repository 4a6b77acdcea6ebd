use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{CsvQuoting, ExportFormat};

// ---------------------------------------------------------------------------
// TablexConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.tablex/config.json`.
///
/// `inline_buttons` is the single persisted user preference; everything else
/// tunes exports and can be edited by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablexConfig {
    // Preference
    pub inline_buttons: bool,

    // Export
    pub default_format: ExportFormat,
    pub csv_quoting: CsvQuoting,
    pub native_xlsx: bool,
    pub xlsx_numeric_cells: bool,
    pub export_stagger_ms: u64,
    pub download_dir: Option<PathBuf>,

    // General
    pub log_level: String,
}

impl Default for TablexConfig {
    fn default() -> Self {
        Self {
            inline_buttons: false,
            default_format: ExportFormat::Excel,
            csv_quoting: CsvQuoting::Always,
            native_xlsx: true,
            xlsx_numeric_cells: false,
            export_stagger_ms: 500,
            download_dir: None,
            log_level: "info".into(),
        }
    }
}

impl TablexConfig {
    /// Returns the base config directory: `~/.tablex/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".tablex"))
    }

    /// Returns the config file path: `~/.tablex/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.tablex/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Where exports land: the configured directory, else the user's
    /// downloads folder, else the working directory.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load config from a specific file path, writing defaults if missing.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            debug!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Read/write access to the persisted inline-buttons preference.
///
/// Only the composition root should hold one of these; request handlers get
/// the current value passed in explicitly.
pub trait Preferences {
    fn inline_buttons(&self) -> bool;
    fn set_inline_buttons(&mut self, enabled: bool) -> Result<()>;
}

/// File-backed config holder.
pub struct ConfigStore {
    path: PathBuf,
    config: TablexConfig,
    created: bool,
}

impl ConfigStore {
    /// Open the store at the default location.
    pub fn open() -> Result<Self> {
        Self::open_at(TablexConfig::config_path()?)
    }

    /// Open the store at an explicit path (tests, `--config`).
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let created = !path.exists();
        let config = TablexConfig::load_from_path(&path)?;
        Ok(Self {
            path,
            config,
            created,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether opening the store wrote a fresh default file.
    pub fn was_created(&self) -> bool {
        self.created
    }

    pub fn get(&self) -> &TablexConfig {
        &self.config
    }

    /// Mutate the config and persist it immediately. The in-memory config
    /// only changes once the file has been written.
    pub fn update(&mut self, f: impl FnOnce(&mut TablexConfig)) -> Result<()> {
        let mut next = self.config.clone();
        f(&mut next);
        next.save_to_path(&self.path)?;
        self.config = next;
        Ok(())
    }
}

impl Preferences for ConfigStore {
    fn inline_buttons(&self) -> bool {
        self.config.inline_buttons
    }

    fn set_inline_buttons(&mut self, enabled: bool) -> Result<()> {
        debug!(enabled, "Persisting inline buttons preference");
        self.update(|c| c.inline_buttons = enabled)
    }
}

/// In-memory preferences, for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    inline_buttons: bool,
}

impl MemoryPreferences {
    pub fn new(inline_buttons: bool) -> Self {
        Self { inline_buttons }
    }
}

impl Preferences for MemoryPreferences {
    fn inline_buttons(&self) -> bool {
        self.inline_buttons
    }

    fn set_inline_buttons(&mut self, enabled: bool) -> Result<()> {
        self.inline_buttons = enabled;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
