//! Noise library discovery.
//!
//! Ambient noises live as audio files in the assets sound directory. Their
//! menu names come from an optional `sound_names.json` next to them, which
//! maps a file name either to a plain string or to per-language names:
//!
//! ```json
//! { "rain.ogg": { "ja": "雨", "en": "Rain" }, "cafe.mp3": "Cafe" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::i18n::Lang;

/// Key meaning "no noise". Always present in a library.
pub const NONE_KEY: &str = "None";

/// Name of the optional display-name mapping file.
pub const SOUND_NAMES_FILE: &str = "sound_names.json";

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

/// Available noises, keyed by their menu name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseLibrary {
    entries: BTreeMap<String, PathBuf>,
}

impl Default for NoiseLibrary {
    fn default() -> Self {
        Self::empty()
    }
}

impl NoiseLibrary {
    /// Creates a library that only knows the silent "None" entry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Creates a library from explicit `(key, path)` pairs.
    pub fn from_entries<I, K, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .filter(|(k, _)| k != NONE_KEY)
                .collect(),
        }
    }

    /// Scans a directory for supported audio files.
    ///
    /// A missing or unreadable directory yields an empty library.
    #[must_use]
    pub fn scan(dir: &Path, lang: Lang) -> Self {
        let mut library = Self::empty();
        if !dir.is_dir() {
            debug!("Sound directory {} not found", dir.display());
            return library;
        }

        let names = load_name_map(&dir.join(SOUND_NAMES_FILE));

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read sound directory {}: {}", dir.display(), e);
                return library;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !is_supported(&path) {
                continue;
            }
            let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let key = match names.get(&file_name) {
                Some(value) => display_name(value, lang, &file_name),
                None => path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or(file_name),
            };
            if key == NONE_KEY {
                continue;
            }
            library.entries.insert(key, path);
        }

        debug!("Found {} noise(s) in {}", library.entries.len(), dir.display());
        library
    }

    /// Returns true if the key names a noise or is the silent key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        key == NONE_KEY || self.entries.contains_key(key)
    }

    /// Returns the file of a noise; `None` for the silent key or unknown keys.
    #[must_use]
    pub fn path(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    /// Returns the menu keys: "None" first, then the noises sorted by name.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        std::iter::once(NONE_KEY)
            .chain(self.entries.keys().map(String::as_str))
            .collect()
    }

    /// Returns the number of actual noises (excluding "None").
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no actual noise is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn load_name_map(path: &Path) -> serde_json::Map<String, Value> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return serde_json::Map::new();
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("{} is not a JSON object, ignoring", path.display());
            serde_json::Map::new()
        }
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            serde_json::Map::new()
        }
    }
}

fn display_name(value: &Value, lang: Lang, file_name: &str) -> String {
    match value {
        Value::Object(by_lang) => by_lang
            .get(lang.code())
            .or_else(|| by_lang.get("en"))
            .and_then(Value::as_str)
            .unwrap_or(file_name)
            .to_string(),
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}
