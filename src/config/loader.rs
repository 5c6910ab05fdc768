//! Startup settings: TOML file, environment and command line, merged in that order.

use crate::model::LineField;
use crate::orchestrator::AutoOpen;
use crate::state::SearchOptions;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PIPELOG_CONFIG";
/// Environment override for [`ResolvedConfig::auto_open`].
pub const AUTO_OPEN_ENV: &str = "PIPELOG_AUTO_OPEN";
/// Environment override for [`ResolvedConfig::case_sensitive`].
pub const CASE_SENSITIVE_ENV: &str = "PIPELOG_CASE_SENSITIVE";

/// Why a config file could not be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `PIPELOG_CONFIG` is not valid UTF-8.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// The file exists but could not be read.
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Bad TOML, an unknown key or a value of the wrong type.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// File with the bad content.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

/// Contents of `config.toml`. Every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Sections fetched as soon as they are created.
    #[serde(default)]
    pub auto_open: Option<AutoOpen>,

    /// Match case exactly when searching.
    #[serde(default)]
    pub case_sensitive: Option<bool>,

    /// Line fields searched, e.g. `["time", "out"]`.
    #[serde(default)]
    pub search_fields: Option<Vec<LineField>>,

    /// Show the time column in line rows.
    #[serde(default)]
    pub show_timestamps: Option<bool>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Effective settings once every layer has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Sections fetched as soon as they are created.
    pub auto_open: AutoOpen,
    /// Match case exactly when searching.
    pub case_sensitive: bool,
    /// Line fields the search looks in.
    pub search_fields: Vec<LineField>,
    /// Show the time column in line rows.
    pub show_timestamps: bool,
    /// Where tracing output goes.
    pub log_file_path: PathBuf,
}

impl ResolvedConfig {
    /// Search settings for a new store.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::new(self.case_sensitive, self.search_fields.iter().copied())
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            auto_open: AutoOpen::default(),
            case_sensitive: false,
            search_fields: vec![LineField::Out],
            show_timestamps: true,
            log_file_path: default_log_path(),
        }
    }
}

/// `<state dir>/pipelog/pipelog.log`, or `pipelog.log` in the working
/// directory on platforms without a state dir.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("pipelog").join("pipelog.log")
    } else {
        PathBuf::from("pipelog.log")
    }
}

/// Read one config file. A missing file is `Ok(None)`.
///
/// # Errors
///
/// The file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// `<config dir>/pipelog/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pipelog").join("config.toml"))
}

/// Find and read the config file.
///
/// The first of `--config`, `PIPELOG_CONFIG` and [`default_config_path`]
/// that is set wins; only that one is read. Missing files mean defaults.
///
/// # Errors
///
/// The chosen file is unreadable or invalid, or `PIPELOG_CONFIG` is not
/// valid UTF-8.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    match std::env::var(CONFIG_ENV) {
        Ok(env_path) => return load_config_file(PathBuf::from(env_path)),
        Err(std::env::VarError::NotUnicode(raw)) => {
            return Err(ConfigError::InvalidPath(raw.to_string_lossy().into_owned()))
        }
        Err(std::env::VarError::NotPresent) => {}
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Lenient boolean used by environment overrides.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Layer `PIPELOG_AUTO_OPEN` and `PIPELOG_CASE_SENSITIVE` on top.
/// Unparseable values are ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Some(auto_open) = std::env::var(AUTO_OPEN_ENV)
        .ok()
        .and_then(|raw| AutoOpen::parse(&raw))
    {
        config.auto_open = auto_open;
    }

    if let Some(case_sensitive) = std::env::var(CASE_SENSITIVE_ENV)
        .ok()
        .and_then(|raw| parse_flag(&raw))
    {
        config.case_sensitive = case_sensitive;
    }

    config
}

/// Fill the gaps of a config file with defaults.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        auto_open: config.auto_open.unwrap_or(defaults.auto_open),
        case_sensitive: config.case_sensitive.unwrap_or(defaults.case_sensitive),
        search_fields: config
            .search_fields
            .filter(|fields| !fields.is_empty())
            .unwrap_or(defaults.search_fields),
        show_timestamps: config.show_timestamps.unwrap_or(defaults.show_timestamps),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Final layer: flags given on the command line. `None` means not passed.
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    auto_open_override: Option<AutoOpen>,
    case_sensitive_override: Option<bool>,
    show_timestamps_override: Option<bool>,
) -> ResolvedConfig {
    if let Some(auto_open) = auto_open_override {
        config.auto_open = auto_open;
    }

    if let Some(case_sensitive) = case_sensitive_override {
        config.case_sensitive = case_sensitive;
    }

    if let Some(show_timestamps) = show_timestamps_override {
        config.show_timestamps = show_timestamps;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
