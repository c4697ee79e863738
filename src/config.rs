//! Data directory resolution and persisted session settings.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SnotesError};
use crate::storage::write_atomic;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "SNOTES_DIR";
/// Directory created under the user's home when no override is set.
pub const DEFAULT_DIR_NAME: &str = ".simple_notes";
pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_AUTOSAVE_MS: u64 = 1000;

/// Settings that survive between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Note that was selected when the last session closed.
    pub last_note_id: Option<Uuid>,
    /// Quiet period before an edit is saved.
    pub autosave_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_note_id: None,
            autosave_ms: DEFAULT_AUTOSAVE_MS,
        }
    }
}

impl AppConfig {
    /// Load `config.json` from `dir`, falling back to defaults.
    ///
    /// A missing or unreadable config is never an error.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "could not read config, using defaults");
                }
                return Self::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Self::default()
        })
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        write_atomic(&dir.join(CONFIG_FILE), &bytes)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }
}

/// Pick the data directory from an explicit override or a home directory.
pub fn resolve_data_dir(override_dir: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home.filter(|h| !h.is_empty())
        .map(|h| PathBuf::from(h).join(DEFAULT_DIR_NAME))
        .ok_or(SnotesError::NoDataDir)
}

/// Resolve the data directory from the environment and make sure it exists.
pub fn data_dir() -> Result<PathBuf> {
    let home = env::var_os("HOME").or_else(|| env::var_os("USERPROFILE"));
    let dir = resolve_data_dir(env::var_os(DATA_DIR_ENV), home)?;
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
