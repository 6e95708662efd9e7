//! Runtime configuration for the replydesk console.
//!
//! Both the CLI and the list controller read `replydesk.toml` through these
//! types. Missing keys fall back to serde defaults; values that would break the
//! controller (an empty url, zero timeouts or row limits) are normalised by
//! [`apply_compat_fallbacks`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "replydesk.toml";

/// Environment variable that overrides `[server] url`.
pub const SERVER_URL_ENV: &str = "REPLYDESK_SERVER_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level console configuration (persisted as `replydesk.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub lists: ListSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListSettings {
    /// Quiet period before a typed search term is sent.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Above this many rows a client-side filtered list logs a warning.
    #[serde(default = "default_client_side_max_rows")]
    pub client_side_max_rows: usize,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            client_side_max_rows: default_client_side_max_rows(),
        }
    }
}

impl ListSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_client_side_max_rows() -> usize {
    500
}

/// Apply compatibility fallbacks after loading raw TOML.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut ConsoleConfig) -> bool {
    let mut changed = false;

    let trimmed = config.server.url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        config.server.url = default_server_url();
        changed = true;
    } else if trimmed != config.server.url {
        config.server.url = trimmed.to_string();
        changed = true;
    }

    if config.server.timeout_secs == 0 {
        config.server.timeout_secs = default_timeout_secs();
        changed = true;
    }

    if config.lists.client_side_max_rows == 0 {
        config.lists.client_side_max_rows = default_client_side_max_rows();
        changed = true;
    }

    changed
}

/// Directory holding `replydesk.toml` (e.g. `~/.config/replydesk`).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("", "", "replydesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(ConfigError::NoConfigDir)
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load config from `path`; a missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str::<ConsoleConfig>(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        ConsoleConfig::default()
    };
    apply_compat_fallbacks(&mut config);
    Ok(config)
}

/// Load the user's config and apply the `REPLYDESK_SERVER_URL` override.
pub fn load() -> Result<ConsoleConfig, ConfigError> {
    let mut config = load_from(&config_path()?)?;
    if let Ok(url) = std::env::var(SERVER_URL_ENV) {
        if !url.trim().is_empty() {
            config.server.url = url;
            apply_compat_fallbacks(&mut config);
        }
    }
    Ok(config)
}

/// Write config to `path`, creating parent directories.
pub fn save_to(config: &ConsoleConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let cfg = ConsoleConfig::default();
        assert_eq!(cfg.server.url, "http://localhost:3000");
        assert_eq!(cfg.server.timeout(), Duration::from_secs(15));
        assert_eq!(cfg.lists.debounce(), Duration::from_millis(500));
        assert_eq!(cfg.lists.client_side_max_rows, 500);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let cfg: ConsoleConfig = toml::from_str(
            r#"
[lists]
debounce_ms = 250
"#,
        )
        .expect("parse toml");

        assert_eq!(cfg.lists.debounce_ms, 250);
        assert_eq!(cfg.lists.client_side_max_rows, 500);
        assert_eq!(cfg.server, ServerSettings::default());
    }

    #[test]
    fn apply_compat_fallbacks_repairs_unusable_values() {
        let mut cfg: ConsoleConfig = toml::from_str(
            r#"
[server]
url = "https://admin.example.org/"
timeout_secs = 0

[lists]
client_side_max_rows = 0
"#,
        )
        .expect("parse toml");

        assert!(apply_compat_fallbacks(&mut cfg));
        assert_eq!(cfg.server.url, "https://admin.example.org");
        assert_eq!(cfg.server.timeout_secs, 15);
        assert_eq!(cfg.lists.client_side_max_rows, 500);
    }

    #[test]
    fn apply_compat_fallbacks_is_noop_for_valid_values() {
        let mut cfg = ConsoleConfig::default();
        let before = cfg.clone();
        assert!(!apply_compat_fallbacks(&mut cfg));
        assert_eq!(cfg, before);
    }

    #[test]
    fn zero_debounce_is_allowed() {
        let mut cfg: ConsoleConfig = toml::from_str("[lists]\ndebounce_ms = 0\n").unwrap();
        assert!(!apply_compat_fallbacks(&mut cfg));
        assert_eq!(cfg.lists.debounce(), Duration::ZERO);
    }

    #[test]
    fn save_then_load_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut cfg = ConsoleConfig::default();
        cfg.server.url = "http://10.0.0.5:8080".into();
        cfg.lists.debounce_ms = 300;
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(loaded, ConsoleConfig::default());
    }

    #[test]
    fn invalid_toml_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server\nurl = ").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
