//! Configuration loader
//!
//! Loads [`ClientOptions`] from environment variables or a file.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the credentials are not there, falls back to loading from file
//! 3. Probes a few paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CLASSEVIVA_USERNAME`: username or e-mail (required)
//! - `CLASSEVIVA_PASSWORD`: password (required)
//! - `CLASSEVIVA_STATE`: region code (`IT`, `SM`, `AR`)
//! - `CLASSEVIVA_APP`: app name or identifier (`students`, `CVVS/famiglia/4.1.8`)
//! - `CLASSEVIVA_HOST`: host override
//! - `CLASSEVIVA_DEBUG`: diagnostic logging (true/false)
//! - `CLASSEVIVA_SAVE_TEMP_FILE`: persist the login response (true/false)
//! - `CLASSEVIVA_KEEP_ALIVE`: renew the session automatically (true/false)
//! - `CLASSEVIVA_CACHE_PATH`: session cache file
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./classeviva.toml` or `./classeviva.json` (current working directory)
//! 2. `../classeviva.toml` or `../classeviva.json` (parent directory)
//! 3. Next to the executable

use std::path::{Path, PathBuf};

use classeviva_domain::{ApiError, App, ClientOptions, State};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CLASSEVIVA_";
const FILE_STEM: &str = "classeviva";

/// Why options could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("No config file found in any of the standard locations")]
    NoConfigFile,

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML format: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON format: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::config(err.to_string())
    }
}

/// Load options with automatic fallback
///
/// First attempts to load from environment variables. If the credentials are
/// missing there, falls back to a probed config file.
///
/// # Errors
/// Returns `ApiError::Config` if neither source yields valid options.
pub fn load() -> Result<ClientOptions, ApiError> {
    match load_from_env() {
        Ok(options) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(options)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load options from environment variables
///
/// Username and password are required; everything else keeps its default
/// when unset.
///
/// # Errors
/// Returns `ApiError::Config` if a required variable is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<ClientOptions, ApiError> {
    let username = env_var("USERNAME")?;
    let password = env_var("PASSWORD")?;
    let mut options = ClientOptions::new(username, password);

    if let Some(state) = env_opt("STATE") {
        options.state = state.parse::<State>().map_err(|reason| ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}STATE"),
            reason,
        })?;
    }
    if let Some(app) = env_opt("APP") {
        options.app = Some(app.parse::<App>().map_err(|reason| ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}APP"),
            reason,
        })?);
    }
    if let Some(host) = env_opt("HOST") {
        options.host = Some(host);
    }
    if let Some(path) = env_opt("CACHE_PATH") {
        options.cache_path = PathBuf::from(path);
    }
    options.debug = env_bool("DEBUG", options.debug);
    options.save_temp_file = env_bool("SAVE_TEMP_FILE", options.save_temp_file);
    options.keep_alive = env_bool("KEEP_ALIVE", options.keep_alive);

    Ok(options)
}

/// Load options from a file
///
/// If `path` is `None`, probes the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientOptions, ApiError> {
    let config_path = match path {
        Some(p) if !p.exists() => return Err(ConfigError::NotFound(p).into()),
        Some(p) => p,
        None => probe_config_paths().ok_or(ConfigError::NoConfigFile)?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::from)?;
    Ok(parse_config(&contents, &config_path)?)
}

/// Parse options from file content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<ClientOptions, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents)?),
        "json" => Ok(serde_json::from_str(contents)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// First existing `classeviva.{toml,json}` among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.into_iter()
        .flat_map(|dir| ["toml", "json"].map(|ext| dir.join(format!("{FILE_STEM}.{ext}"))))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String, ConfigError> {
    env_opt(key).ok_or_else(|| ConfigError::MissingVar(format!("{ENV_PREFIX}{key}")))
}

/// Non-empty value of `CLASSEVIVA_{key}`.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok().filter(|value| !value.is_empty())
}

/// Parse a boolean variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
/// Returns `default` if the variable is not set.
fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
