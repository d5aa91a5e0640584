//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in `<root_folder>/shiplabel.toml`. Every key
//! is optional; missing keys fall back to the built-in defaults below. The
//! SQLite database sits next to it as `<root_folder>/shiplabel.db`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "SHIPLABEL_ROOT_FOLDER";

/// Configuration file name inside the root folder
pub const CONFIG_FILE_NAME: &str = "shiplabel.toml";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "shiplabel.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Root folder override (only honoured from the user config file)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Collaborator call timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// PDF label heuristics
    #[serde(default)]
    pub pdf: PdfConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Upper bounds for decoder and store calls, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutConfig {
    #[serde(default = "default_decode_timeout_ms")]
    pub decode_ms: u64,

    #[serde(default = "default_store_timeout_ms")]
    pub store_ms: u64,
}

/// Marker tokens used by the PDF label rules, plus the fallback destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PdfConfig {
    /// A line containing any of these is taken as the company line
    #[serde(default = "default_company_markers")]
    pub company_markers: Vec<String>,

    /// A line containing any of these is taken as the street line
    #[serde(default = "default_street_markers")]
    pub street_markers: Vec<String>,

    /// Destination used when the label text carries no usable zip/city
    #[serde(default)]
    pub destination: DestinationProfile,
}

/// Fallback destination fields for the PDF label format
///
/// The observed label format always ships to one destination, so these
/// fields are filled from configuration unless the text itself yields a
/// confident zip/city match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DestinationProfile {
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

fn default_port() -> u16 {
    5790
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_decode_timeout_ms() -> u64 {
    30_000
}

fn default_store_timeout_ms() -> u64 {
    10_000
}

fn default_company_markers() -> Vec<String> {
    vec!["BELGIUM".to_string()]
}

fn default_street_markers() -> Vec<String> {
    vec!["BROEKOOI".to_string(), "Z.4".to_string()]
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            logging: LoggingConfig::default(),
            timeouts: TimeoutConfig::default(),
            pdf: PdfConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            decode_ms: default_decode_timeout_ms(),
            store_ms: default_store_timeout_ms(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            company_markers: default_company_markers(),
            street_markers: default_street_markers(),
            destination: DestinationProfile::default(),
        }
    }
}

impl Default for DestinationProfile {
    fn default() -> Self {
        Self {
            city: "ZELLIK".to_string(),
            state: String::new(),
            country: "Belgium".to_string(),
            zip_code: "1731".to_string(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from `path`
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. `root_folder` key of the user config file
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(root_folder) = user_config_root_folder() {
        return root_folder;
    }

    default_root_folder()
}

/// Path of the bootstrap config file inside a root folder
pub fn config_path(root_folder: &Path) -> PathBuf {
    root_folder.join(CONFIG_FILE_NAME)
}

/// Path of the SQLite database inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

fn user_config_root_folder() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("shiplabel").join("config.toml");
    let content = std::fs::read_to_string(path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;
    config
        .get("root_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shiplabel"))
        .unwrap_or_else(|| PathBuf::from("./shiplabel_data"))
}
