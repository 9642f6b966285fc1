//! Configuration loading and root folder resolution
//!
//! Both the config file and the root folder follow the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (root folder only) / per-user config directory (config file)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SHOWLIST_CONFIG";

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "SHOWLIST_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "showlist.db";

/// Default ticketing discovery endpoint
pub const DEFAULT_TICKETING_URL: &str = "https://app.ticketmaster.com/discovery/v2/events.json";

/// Complete TOML configuration file
///
/// Every section is optional; a missing file yields `TomlConfig::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding `showlist.db`
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub sync: SyncSection,
    pub matching: MatchingSection,
    pub ticketing: TicketingSection,
    /// Canonical venue names and their alternate spellings
    pub venues: Vec<VenueConfig>,
    /// Venue pages with embedded JSON-LD event metadata
    pub structured_sources: Vec<PageSourceConfig>,
    /// Venue pages scraped by date/name proximity
    pub heuristic_sources: Vec<PageSourceConfig>,
    /// Manually curated override entries
    pub manual: Vec<ManualEntryConfig>,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset ("trace" .. "error")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[sync]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Upper bound on one adapter's whole fetch
    pub adapter_timeout_secs: u64,
    /// Per-request HTTP timeout
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Age after which a held run lock may be taken over
    pub lock_stale_secs: u64,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            adapter_timeout_secs: 30,
            http_timeout_secs: 20,
            user_agent: format!("showlist/{} (live music listings)", env!("CARGO_PKG_VERSION")),
            lock_stale_secs: 900,
        }
    }
}

/// `[matching]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    /// Minimum share of the shorter name's tokens found in the longer name
    pub containment_threshold: f64,
    /// Minimum Jaro-Winkler similarity of the normalized names
    pub fuzzy_threshold: f64,
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            containment_threshold: 0.8,
            fuzzy_threshold: 0.93,
        }
    }
}

/// `[ticketing]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketingSection {
    pub enabled: bool,
    pub base_url: String,
    /// Overridden by `SHOWLIST_TICKETING_API_KEY`
    pub api_key: Option<String>,
    pub city: String,
    pub classification: String,
    pub page_size: u32,
}

impl Default for TicketingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_TICKETING_URL.to_string(),
            api_key: None,
            city: "Atlanta".to_string(),
            classification: "music".to_string(),
            page_size: 100,
        }
    }
}

/// `[[venues]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Canonical display name
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// `[[structured_sources]]` / `[[heuristic_sources]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSourceConfig {
    /// Source tag, used in logs and native identity keys
    pub name: String,
    /// Venue the page lists shows for
    pub venue: String,
    pub url: String,
}

/// `[[manual]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualEntryConfig {
    /// Show date, `YYYY-MM-DD` or any format the normalizer accepts
    pub date: String,
    pub name: String,
    pub venue: String,
    #[serde(default)]
    pub lineup: Option<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load configuration from a TOML file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_toml_config(&content)
}

/// Locate the config file
///
/// Returns `None` when neither CLI nor environment names a file and the
/// per-user default does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Load configuration, falling back to defaults when no file is present
///
/// An explicitly named file that cannot be read is an error; a missing
/// per-user default is not.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            load_toml_config(&path)
        }
        None => {
            tracing::info!("No configuration file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Per-user config file location (`~/.config/showlist/showlist.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("showlist").join("showlist.toml"))
}

/// Resolve the root folder holding the database
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("showlist"))
        .unwrap_or_else(|| PathBuf::from("./showlist_data"))
}
