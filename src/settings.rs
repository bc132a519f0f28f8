//! User settings that outlive a single generation
//!
//! Only the Gemini API key is kept. It is loaded once at startup and
//! written back whenever it changes; the last write wins.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::Result;

/// Key under which the credential is stored
pub const API_KEY_FIELD: &str = "geminiApiKey";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "geminiApiKey", default)]
    pub api_key: String,
}

impl Settings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Where settings live between runs
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or defaults when nothing was saved yet
    fn load(&self) -> Result<Settings>;

    fn save(&self, settings: &Settings) -> Result<()>;
}

/// TOML file store
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("No settings file at {}", self.path.display());
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, toml::to_string(settings)?)?;
        debug!("Settings written to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, counts writes
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
    writes: Mutex<usize>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            writes: Mutex::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Settings loaded from a store, saved back on every change
pub struct CachedSettings {
    store: Box<dyn SettingsStore>,
    current: Settings,
}

impl CachedSettings {
    pub fn open(store: Box<dyn SettingsStore>) -> Result<Self> {
        let current = store.load()?;
        Ok(Self { store, current })
    }

    pub fn get(&self) -> &Settings {
        &self.current
    }

    /// Returns whether the stored value changed
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<bool> {
        let api_key = api_key.into();
        if api_key == self.current.api_key {
            return Ok(false);
        }
        self.current.api_key = api_key;
        self.store.save(&self.current)?;
        Ok(true)
    }
}
