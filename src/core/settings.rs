/*
 * Manages the user preferences the window controller reads and writes: the
 * editor font size and whether line numbers are shown. The preferences are
 * accessed through `SettingsOperations` so the controller can be driven with an
 * in-memory store in tests and in non-persistent runs. `CoreSettingsStore`
 * keeps them as JSON in the per-user configuration directory.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SETTINGS_FILENAME: &str = "settings.json";

pub const DEFAULT_FONT_SIZE: f64 = 12.0;

#[derive(Debug)]
pub enum SettingsError {
    Io(io::Error),
    Json(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for SettingsError {
    fn from(err: io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Json(err)
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Settings I/O error: {e}"),
            SettingsError::Json(e) => write!(f, "Settings JSON error: {e}"),
            SettingsError::NoConfigDirectory => {
                write!(f, "Could not determine configuration directory for settings")
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Json(e) => Some(e),
            SettingsError::NoConfigDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;

pub trait SettingsOperations: Send + Sync {
    fn font_size(&self) -> f64;
    fn set_font_size(&self, size: f64);
    fn show_line_numbers(&self) -> bool;
    fn set_show_line_numbers(&self, show: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsData {
    pub font_size: f64,
    pub show_line_numbers: bool,
}

impl Default for SettingsData {
    fn default() -> Self {
        SettingsData {
            font_size: DEFAULT_FONT_SIZE,
            show_line_numbers: false,
        }
    }
}

fn lock_data(data: &Mutex<SettingsData>) -> MutexGuard<'_, SettingsData> {
    // The data is plain values, so a poisoned lock still holds a usable state.
    data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/*
 * Settings persisted to `settings.json`. The file is read once at
 * construction and rewritten after every change. A missing file yields the
 * defaults silently; an unreadable or malformed one yields the defaults with a
 * warning, and is replaced on the next save.
 */
#[derive(Debug)]
pub struct CoreSettingsStore {
    file_path: PathBuf,
    data: Mutex<SettingsData>,
}

impl CoreSettingsStore {
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir =
            path_utils::app_config_local_dir(app_name).ok_or(SettingsError::NoConfigDirectory)?;
        Ok(Self::with_directory(&config_dir))
    }

    pub fn with_directory(config_dir: &Path) -> Self {
        let file_path = config_dir.join(SETTINGS_FILENAME);
        let data = match Self::load(&file_path) {
            Ok(Some(data)) => {
                log::debug!("CoreSettingsStore: Loaded settings from {file_path:?}.");
                data
            }
            Ok(None) => {
                log::debug!("CoreSettingsStore: No settings file at {file_path:?}; using defaults.");
                SettingsData::default()
            }
            Err(err) => {
                log::warn!(
                    "CoreSettingsStore: Could not load settings from {file_path:?}: {err}. Using defaults."
                );
                SettingsData::default()
            }
        };
        CoreSettingsStore {
            file_path,
            data: Mutex::new(data),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn snapshot(&self) -> SettingsData {
        *lock_data(&self.data)
    }

    fn load(file_path: &Path) -> Result<Option<SettingsData>> {
        if !file_path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(file_path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, data: &SettingsData) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&self.file_path, json)?;
        log::trace!("CoreSettingsStore: Saved settings to {:?}.", self.file_path);
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut SettingsData)) {
        let mut data = lock_data(&self.data);
        change(&mut *data);
        if let Err(err) = self.save(&*data) {
            log::error!(
                "CoreSettingsStore: Failed to save settings to {:?}: {err}",
                self.file_path
            );
        }
    }
}

impl SettingsOperations for CoreSettingsStore {
    fn font_size(&self) -> f64 {
        lock_data(&self.data).font_size
    }

    fn set_font_size(&self, size: f64) {
        self.update(|data| data.font_size = size);
    }

    fn show_line_numbers(&self) -> bool {
        lock_data(&self.data).show_line_numbers
    }

    fn set_show_line_numbers(&self, show: bool) {
        self.update(|data| data.show_line_numbers = show);
    }
}

/* Settings that live only as long as the process. */
#[derive(Debug, Default)]
pub struct InMemorySettings {
    data: Mutex<SettingsData>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsOperations for InMemorySettings {
    fn font_size(&self) -> f64 {
        lock_data(&self.data).font_size
    }

    fn set_font_size(&self, size: f64) {
        lock_data(&self.data).font_size = size;
    }

    fn show_line_numbers(&self) -> bool {
        lock_data(&self.data).show_line_numbers
    }

    fn set_show_line_numbers(&self, show: bool) {
        lock_data(&self.data).show_line_numbers = show;
    }
}
