//! Configuration loading and root folder resolution
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `LORE_CONFIG` environment variable
//! 3. Platform config file (`~/.config/lore/config.toml`, then `/etc/lore/config.toml`)
//! 4. Compiled defaults (missing file is a warning, not an error)
//!
//! Root folder resolution order:
//! 1. Command-line argument
//! 2. `LORE_ROOT` environment variable
//! 3. `root_folder` key in the TOML config
//! 4. OS-dependent compiled default

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the root folder
pub const ROOT_ENV_VAR: &str = "LORE_ROOT";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LORE_CONFIG";

/// Default database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "lore.db";

/// Default tracing directive
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Raw TOML config file contents. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub database_file: Option<String>,
    /// Registry TOML; the built-in catalog is used when absent
    pub schema_file: Option<PathBuf>,
    pub cache_effective_map: Option<bool>,
    /// Recorded as `created_by` on every override written by this process
    pub created_by: Option<String>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Read and parse a config file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoreConfig {
    pub root_folder: PathBuf,
    pub database_file: String,
    pub schema_file: Option<PathBuf>,
    pub cache_effective_map: bool,
    pub created_by: Option<String>,
    pub log_level: String,
    /// Config file the values came from; `None` means compiled defaults
    pub config_file: Option<PathBuf>,
}

impl LoreConfig {
    /// Locate, read and resolve configuration
    ///
    /// An explicitly named config file (CLI or `LORE_CONFIG`) must exist.
    /// A missing platform config file falls back to compiled defaults.
    ///
    /// Runs before logging is set up, so it emits nothing itself; call
    /// [`LoreConfig::log_source`] once a subscriber exists.
    pub fn load(cli_root: Option<&Path>, cli_config: Option<&Path>) -> Result<Self> {
        let config_file = locate_config_file(cli_config)?;
        let toml = match &config_file {
            Some(path) => TomlConfig::from_path(path)?,
            None => TomlConfig::default(),
        };

        Ok(Self {
            config_file,
            ..Self::resolve(toml, cli_root)
        })
    }

    /// True when no config file was found and compiled defaults apply
    pub fn uses_compiled_defaults(&self) -> bool {
        self.config_file.is_none()
    }

    /// Report where the configuration came from
    pub fn log_source(&self) {
        match &self.config_file {
            Some(path) => debug!("Loaded config file: {}", path.display()),
            None => warn!("No config file found, using compiled defaults"),
        }
    }

    /// Apply precedence rules to parsed TOML and the CLI root argument
    pub fn resolve(toml: TomlConfig, cli_root: Option<&Path>) -> Self {
        let root_folder = resolve_root_folder(cli_root, toml.root_folder.as_deref());

        Self {
            root_folder,
            database_file: toml
                .database_file
                .unwrap_or_else(|| DEFAULT_DATABASE_FILE.to_string()),
            schema_file: toml.schema_file,
            cache_effective_map: toml.cache_effective_map.unwrap_or(true),
            created_by: toml.created_by,
            log_level: toml
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            config_file: None,
        }
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(&self.database_file)
    }

    /// Path of the registry file; relative paths are taken from the root folder
    pub fn schema_path(&self) -> Option<PathBuf> {
        self.schema_file.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.root_folder.join(p)
            }
        })
    }

    /// Create the root folder if needed
    pub fn ensure_root_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }
}

impl Default for LoreConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default(), None)
    }
}

/// Find the config file to load, if any
pub fn locate_config_file(cli_config: Option<&Path>) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_config {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(Error::Config(format!(
                "{} points to missing file: {}",
                CONFIG_ENV_VAR,
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    // Priority 3: Platform config locations
    Ok(platform_config_candidates().into_iter().find(|p| p.exists()))
}

fn platform_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("lore").join("config.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/lore/config.toml"));
    }
    candidates
}

/// Resolve the root folder from CLI, environment, TOML, then OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_root: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_root {
        return path.to_path_buf();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lore
        dirs::data_local_dir()
            .map(|d| d.join("lore"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lore"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lore
        dirs::data_dir()
            .map(|d| d.join("lore"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lore"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lore
        dirs::data_local_dir()
            .map(|d| d.join("lore"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lore"))
    } else {
        PathBuf::from("./lore_data")
    }
}
