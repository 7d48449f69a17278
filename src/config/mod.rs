//! Configuration for LeanFocus.
//!
//! - `settings`: the persisted [`FocusConfig`] and its normalization rules
//! - `error`: [`ConfigError`]
//! - [`ConfigStore`]: the file-backed, thread-safe store the engine reads
//!   through the [`ConfigPort`] trait
//!
//! Settings are loaded once at startup. They change only through the store's
//! explicit setters, each of which saves the file immediately.

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{
    FocusConfig, BREAK_SECONDS_RANGE, FONT_SIZE_RANGE, WORK_SECONDS_RANGE,
};

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::sound::NoiseLibrary;
use crate::types::{Phase, PhaseDurations};

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Application directory name under the platform config directory.
const APP_DIR_NAME: &str = "leanfocus";

/// Settings the timer engine reads at the moment it needs them.
pub trait ConfigPort: Send + Sync {
    /// Phase lengths.
    fn durations(&self) -> PhaseDurations;

    /// Noise key selected for a phase.
    fn noise_for(&self, phase: Phase) -> String;

    /// Playback volume, 0.0 to 1.0.
    fn volume(&self) -> f32;
}

// ============================================================================
// ConfigStore
// ============================================================================

/// File-backed settings store.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    library: Arc<NoiseLibrary>,
    config: RwLock<FocusConfig>,
}

impl ConfigStore {
    /// Loads the configuration file, falling back to defaults.
    ///
    /// A missing file is normal on first start. An unreadable or invalid
    /// file is logged and replaced by defaults on the next save.
    pub fn load(path: impl Into<PathBuf>, library: Arc<NoiseLibrary>) -> Self {
        let path = path.into();
        let config = match Self::read_file(&path) {
            Ok(config) => {
                debug!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) if e.is_not_found() => {
                debug!("{}, using defaults", e);
                FocusConfig::default()
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                FocusConfig::default()
            }
        };

        Self {
            path: Some(path),
            config: RwLock::new(config.normalized(&library)),
            library,
        }
    }

    /// Creates a store that is never written to disk.
    pub fn in_memory(config: FocusConfig, library: Arc<NoiseLibrary>) -> Self {
        Self {
            path: None,
            config: RwLock::new(config.normalized(&library)),
            library,
        }
    }

    /// Reads and parses a configuration file without normalizing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or invalid.
    pub fn read_file(path: &Path) -> Result<FocusConfig, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the default configuration file location.
    ///
    /// Uses the platform config directory, or the working directory if the
    /// platform has none.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Returns the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the noise library used to validate selections.
    pub fn library(&self) -> &Arc<NoiseLibrary> {
        &self.library
    }

    /// Returns a copy of the current settings.
    pub fn snapshot(&self) -> FocusConfig {
        self.read().clone()
    }

    /// Writes the current settings to the backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no backing file or writing fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.path.as_deref().ok_or(ConfigError::NoBackingFile)?;
        let json = serde_json::to_string_pretty(&*self.read())?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Selects the noise for a phase.
    ///
    /// Returns false, leaving the settings untouched, if the key is unknown.
    pub fn set_noise(&self, phase: Phase, key: &str) -> bool {
        if !self.library.contains(key) {
            warn!("Ignoring unknown {} noise '{}'", phase.noise_slot(), key);
            return false;
        }
        *self.write().noise_for_mut(phase) = key.to_string();
        info!(slot = phase.noise_slot(), noise = key, "Noise selected");
        self.persist();
        true
    }

    /// Sets the playback volume, clamped to 0.0..=1.0. Returns the stored value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = settings::clamp_unit(volume, 1.0, 0.0);
        self.write().volume = volume;
        self.persist();
        volume
    }

    /// Flips overlay visibility and returns the new value.
    pub fn toggle_show_timer(&self) -> bool {
        let shown = {
            let mut config = self.write();
            config.show_timer = !config.show_timer;
            config.show_timer
        };
        self.persist();
        shown
    }

    /// Stores overlay font size and opacity, clamped to their ranges.
    ///
    /// Returns the stored values.
    pub fn set_visual(&self, font_size: u32, opacity: f32) -> (u32, f32) {
        let stored = {
            let mut config = self.write();
            config.font_size = font_size.clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end());
            config.opacity = settings::clamp_unit(opacity, 0.7, 0.1);
            (config.font_size, config.opacity)
        };
        self.persist();
        stored
    }

    /// Stores the overlay position after a drag.
    pub fn set_window_position(&self, x: i32, y: i32) {
        {
            let mut config = self.write();
            config.window_x = Some(x);
            config.window_y = Some(y);
        }
        self.persist();
    }

    fn persist(&self) {
        match self.save() {
            Ok(()) | Err(ConfigError::NoBackingFile) => {}
            Err(e) => warn!("Failed to save configuration: {}", e),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FocusConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FocusConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigPort for ConfigStore {
    fn durations(&self) -> PhaseDurations {
        self.read().durations()
    }

    fn noise_for(&self, phase: Phase) -> String {
        self.read().noise_for(phase).to_string()
    }

    fn volume(&self) -> f32 {
        self.read().volume
    }
}

/// A fixed configuration, used when settings never change at runtime.
impl ConfigPort for FocusConfig {
    fn durations(&self) -> PhaseDurations {
        FocusConfig::durations(self)
    }

    fn noise_for(&self, phase: Phase) -> String {
        FocusConfig::noise_for(self, phase).to_string()
    }

    fn volume(&self) -> f32 {
        self.volume
    }
}

// ============================================================================
// Tests
// ============================================================================
