//! Application configuration for the course importer.
//!
//! User config lives at `~/.courseimport/courseimport.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CourseImportError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "courseimport.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".courseimport";

// ---------------------------------------------------------------------------
// Config structs (matching courseimport.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outbound fetch settings.
    #[serde(default)]
    pub importer: ImporterSection,
}

/// `[importer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterSection {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with the page request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept header sent with the page request.
    #[serde(default = "default_accept")]
    pub accept: String,

    /// Maximum redirects followed before giving up.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Number of leading HTML characters kept in the result preview.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ImporterSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept: default_accept(),
            max_redirects: default_max_redirects(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "CourseImporterBot/1.0 (+https://event-matcher-admin)".into()
}
fn default_accept() -> String {
    "text/html,application/xhtml+xml".into()
}
fn default_max_redirects() -> usize {
    10
}
fn default_preview_chars() -> usize {
    2000
}

// ---------------------------------------------------------------------------
// Importer config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime importer configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Whole-request timeout.
    pub timeout: std::time::Duration,
    pub user_agent: String,
    pub accept: String,
    pub max_redirects: usize,
    pub preview_chars: usize,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ImporterConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: std::time::Duration::from_secs(config.importer.timeout_secs),
            user_agent: config.importer.user_agent.clone(),
            accept: config.importer.accept.clone(),
            max_redirects: config.importer.max_redirects,
            preview_chars: config.importer.preview_chars,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.courseimport/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseImportError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.courseimport/courseimport.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseImportError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        CourseImportError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CourseImportError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CourseImportError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseImportError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject settings the importer cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.importer.timeout_secs == 0 {
        return Err(CourseImportError::config(
            "importer.timeout_secs must be greater than zero",
        ));
    }
    if config.importer.user_agent.trim().is_empty() {
        return Err(CourseImportError::config("importer.user_agent must not be empty"));
    }
    Ok(())
}
