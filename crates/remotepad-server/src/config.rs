//! TOML-based configuration persistence for the server.
//!
//! Reads and writes [`ServerConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\RemotePad\server.toml`
//! - Linux:    `~/.config/remotepad/server.toml`
//! - macOS:    `~/Library/Application Support/RemotePad/server.toml`
//!
//! Fields annotated with `#[serde(default = "...")]` fall back to their
//! defaults when absent, so the app works on first run and across upgrades
//! from older config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level server configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub network: NetworkSection,
}

/// Identity and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Name reported to clients in the ServerInfo reply.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Version string reported to clients.
    #[serde(default = "default_server_version")]
    pub version: String,
    /// Control-channel password. Empty means no authentication required.
    #[serde(default)]
    pub password: String,
    /// When set, discovery probes are ignored and the server stays invisible
    /// to network scans.
    #[serde(default)]
    pub silent_discovery: bool,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Port and bind-address settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// TCP port for the control channel.
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,
    /// UDP port for LAN discovery probes.
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,
    /// IP address to bind both sockets to. `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_server_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "RemotePad".to_string())
}
fn default_server_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_tcp_port() -> u16 {
    1978
}
fn default_udp_port() -> u16 {
    1978
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            network: NetworkSection::default(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
            password: String::new(),
            silent_discovery: false,
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            tcp_port: default_tcp_port(),
            udp_port: default_udp_port(),
            bind_address: default_bind_address(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("server.toml"))
}

/// Loads [`ServerConfig`] from disk, returning defaults if the file does not
/// yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    let path = config_file_path()?;
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &ServerConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
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
