//! Shared configuration for the busmap CLI and TUI.
//!
//! TOML profiles, tile API key resolution (env + keyring + plaintext),
//! and translation to `busmap_core::ControllerConfig`. The CLI layers its
//! global flags on top of what this crate produces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use busmap_core::ControllerConfig;
use busmap_core::config::{DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use busmap_core::map::{DEFAULT_CENTER, DEFAULT_TILE_URL, DEFAULT_ZOOM, MapView};

const KEYRING_SERVICE: &str = "busmap";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named InfoPoint profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile name to use: explicit override, then `default_profile`,
    /// then `"default"`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// A named InfoPoint deployment plus map settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// InfoPoint root (e.g., "https://bustracker.pvta.com/InfoPoint").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Vehicle poll period in seconds.
    pub poll_interval_secs: Option<u64>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub zoom: Option<u8>,

    /// XYZ tile template with `{z}`, `{x}`, `{y}` placeholders.
    pub tile_url: Option<String>,

    /// Tile API key (plaintext; prefer keyring or env var).
    pub tile_api_key: Option<String>,

    /// Environment variable name containing the tile API key.
    pub tile_api_key_env: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_secs: None,
            timeout: None,
            center_lat: None,
            center_lon: None,
            zoom: None,
            tile_url: None,
            tile_api_key: None,
            tile_api_key_env: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "busmap", "busmap").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("busmap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered over defaults and under `BUSMAP_*`
/// environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BUSMAP_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Tile key resolution ─────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/tile-api-key"))
}

/// Resolve the tile API key. Tiles work without one, so a miss is `None`.
pub fn resolve_tile_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's tile_api_key_env → env var lookup
    if let Some(ref env_name) = profile.tile_api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .tile_api_key
        .as_ref()
        .map(|key| SecretString::from(key.clone()))
}

/// Store a tile API key in the system keyring.
pub fn store_tile_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(key)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build the map view for a profile, filling gaps with built-in defaults.
pub fn profile_map_view(profile: &Profile, profile_name: &str) -> Result<MapView, ConfigError> {
    let zoom = profile.zoom.unwrap_or(DEFAULT_ZOOM);
    if zoom > 19 {
        return Err(ConfigError::Validation {
            field: "zoom".into(),
            reason: format!("expected 0-19, got {zoom}"),
        });
    }

    Ok(MapView {
        center: (
            profile.center_lat.unwrap_or(DEFAULT_CENTER.0),
            profile.center_lon.unwrap_or(DEFAULT_CENTER.1),
        ),
        zoom,
        tile_url: profile
            .tile_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TILE_URL.into()),
        tile_api_key: resolve_tile_api_key(profile, profile_name),
    })
}

/// Build a `ControllerConfig` from a profile, no CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ControllerConfig, ConfigError> {
    let base_url: url::Url = profile
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", profile.base_url),
        })?;

    let mut config = ControllerConfig::new(base_url);
    config.timeout = profile
        .timeout
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
    config.poll_interval = profile
        .poll_interval_secs
        .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs);
    config.map = profile_map_view(profile, profile_name)?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn profile_defaults_fill_everything() {
        let cfg = profile_to_controller_config(&Profile::default(), "busmap-test-none").unwrap();
        assert_eq!(cfg.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.map.center, DEFAULT_CENTER);
        assert_eq!(cfg.map.zoom, 13);
        assert!(cfg.trace_loading);
    }

    #[test]
    fn profile_overrides_apply() {
        let profile = Profile {
            base_url: "http://localhost:9000/InfoPoint".into(),
            poll_interval_secs: Some(10),
            center_lat: Some(42.39),
            zoom: Some(15),
            tile_api_key: Some("abc".into()),
            ..Profile::default()
        };
        let cfg = profile_to_controller_config(&profile, "busmap-test-overrides").unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(10));
        assert_eq!(cfg.map.center, (42.39, DEFAULT_CENTER.1));
        assert_eq!(cfg.map.zoom, 15);
        assert_eq!(cfg.map.tile_api_key.unwrap().expose_secret(), "abc");
    }

    #[test]
    fn bad_values_are_rejected() {
        let bad_url = Profile {
            base_url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_controller_config(&bad_url, "x"),
            Err(ConfigError::Validation { field, .. }) if field == "base_url"
        ));

        let bad_zoom = Profile {
            zoom: Some(30),
            ..Profile::default()
        };
        assert!(matches!(
            profile_map_view(&bad_zoom, "x"),
            Err(ConfigError::Validation { field, .. }) if field == "zoom"
        ));
    }

    #[test]
    fn save_then_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "pvta".into(),
            Profile {
                zoom: Some(14),
                ..Profile::default()
            },
        );
        cfg.default_profile = Some("pvta".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile_name(None), "pvta");
        assert_eq!(loaded.profile("pvta").unwrap().zoom, Some(14));
        assert_eq!(loaded.defaults.output, "table");
        assert!(matches!(
            loaded.profile("missing"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.profile_name(Some("other")), "other");
        assert!(loaded.profiles.is_empty());
    }
}
