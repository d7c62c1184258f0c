//! TOML-based preference persistence for the client.
//!
//! Stores the last used connection, the pointer-speed multiplier, and the
//! connection history in the platform config dir:
//! - Windows:  `%APPDATA%\RemotePad\client.toml`
//! - Linux:    `~/.config/remotepad/client.toml`
//! - macOS:    `~/Library/Application Support/RemotePad/client.toml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound of the pointer-speed multiplier.
pub const MIN_POINTER_SPEED: f32 = 0.25;
/// Upper bound of the pointer-speed multiplier.
pub const MAX_POINTER_SPEED: f32 = 3.0;
/// Most recent connections kept in the history list.
pub const MAX_HISTORY: usize = 10;

/// Error type for preference file operations.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing prefs at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse prefs TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The prefs could not be serialized to TOML.
    #[error("failed to serialize prefs: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level client preferences stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientPrefs {
    #[serde(default)]
    pub connection: ConnectionPrefs,
    /// Multiplier applied to touchpad pointer deltas, kept in
    /// [[`MIN_POINTER_SPEED`], [`MAX_POINTER_SPEED`]].
    #[serde(default = "default_pointer_speed")]
    pub pointer_speed: f32,
    /// Previously used servers, most recent first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// The connection used last, pre-filled on the next launch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionPrefs {
    #[serde(default)]
    pub last_host: String,
    #[serde(default = "default_port")]
    pub last_port: u16,
    #[serde(default)]
    pub password: String,
}

/// One remembered server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Display name as reported by the server, possibly empty.
    #[serde(default)]
    pub name: String,
    pub host: String,
    pub port: u16,
}

fn default_pointer_speed() -> f32 {
    1.0
}
fn default_port() -> u16 {
    1978
}

impl Default for ClientPrefs {
    fn default() -> Self {
        Self {
            connection: ConnectionPrefs::default(),
            pointer_speed: default_pointer_speed(),
            history: Vec::new(),
        }
    }
}

impl Default for ConnectionPrefs {
    fn default() -> Self {
        Self {
            last_host: String::new(),
            last_port: default_port(),
            password: String::new(),
        }
    }
}

impl ClientPrefs {
    /// Returns the prefs with the pointer speed forced into its bounds.
    pub fn clamped(mut self) -> Self {
        self.pointer_speed = clamp_pointer_speed(self.pointer_speed);
        self
    }

    /// Records a connection at the front of the history, deduplicating by
    /// host and port and keeping at most [`MAX_HISTORY`] entries.
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history
            .retain(|e| !(e.host == entry.host && e.port == entry.port));
        self.history.insert(0, entry);
        self.history.truncate(MAX_HISTORY);
    }
}

/// Forces a pointer-speed value into its allowed range.
pub fn clamp_pointer_speed(value: f32) -> f32 {
    if value.is_nan() {
        return default_pointer_speed();
    }
    value.clamp(MIN_POINTER_SPEED, MAX_POINTER_SPEED)
}

/// Resolves the full path to the prefs file.
///
/// # Errors
///
/// Returns [`PrefsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn prefs_file_path() -> Result<PathBuf, PrefsError> {
    platform_config_dir()
        .map(|dir| dir.join("client.toml"))
        .ok_or(PrefsError::NoPlatformConfigDir)
}

/// Loads preferences from disk, returning defaults if the file does not yet
/// exist. The pointer speed is clamped on the way in.
///
/// # Errors
///
/// Returns [`PrefsError::Io`] for file-system errors other than "not found",
/// and [`PrefsError::Parse`] if the TOML is malformed.
pub fn load_prefs() -> Result<ClientPrefs, PrefsError> {
    let path = prefs_file_path()?;
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let prefs: ClientPrefs = toml::from_str(&content)?;
            Ok(prefs.clamped())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientPrefs::default()),
        Err(e) => Err(PrefsError::Io { path, source: e }),
    }
}

/// Persists `prefs` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`PrefsError::Io`] for file-system failures or
/// [`PrefsError::Serialize`] if serialization fails.
pub fn save_prefs(prefs: &ClientPrefs) -> Result<(), PrefsError> {
    let path = prefs_file_path()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| PrefsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(prefs)?;
    std::fs::write(&path, content).map_err(|source| PrefsError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RemotePad"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RemotePad")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("remotepad"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
