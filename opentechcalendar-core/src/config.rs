//! Runtime configuration.
//!
//! Settings come from an optional TOML file at
//! ~/.config/opentechcalendartools/config.toml, overridden by
//! `OPEN_TECH_CALENDAR_TOOLS_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_USER_AGENT, ENV_PREFIX};
use crate::error::{ImportError, ImportResult};

/// Raw settings as read from file and environment.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
struct Settings {
    sqlite_database_filename: Option<PathBuf>,
    data_directory: Option<PathBuf>,
    request_cache_directory: Option<PathBuf>,
    /// e.g. "6h"; unset means cached responses never expire.
    request_cache_expiry: Option<String>,
    user_agent: Option<String>,
}

/// Validated configuration handed to the importer.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    pub sqlite_database_filename: PathBuf,
    /// Root of the data repository; events go under `event/<group>/`.
    pub data_directory: PathBuf,
    pub request_cache_directory: Option<PathBuf>,
    pub request_cache_expiry: Option<Duration>,
    pub user_agent: String,
}

impl ImportConfig {
    pub fn config_path() -> ImportResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ImportError::Config("Could not determine config directory".into()))?
            .join("opentechcalendartools");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the given file (or the default location) plus the environment.
    pub fn load(config_file: Option<&Path>) -> ImportResult<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::config_path()?, false),
        };

        let config = Config::builder()
            .add_source(File::from(path).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| ImportError::Config(e.to_string()))?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> ImportResult<Self> {
        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ImportError::Config(e.to_string()))?;

        let sqlite_database_filename = settings.sqlite_database_filename.ok_or_else(|| {
            ImportError::Config(format!(
                "Must specify {ENV_PREFIX}_SQLITE_DATABASE_FILENAME env var"
            ))
        })?;

        let data_directory = match settings.data_directory {
            Some(dir) => expand_tilde(&dir),
            None => std::env::current_dir()?,
        };

        let request_cache_expiry = settings
            .request_cache_expiry
            .as_deref()
            .map(humantime::parse_duration)
            .transpose()
            .map_err(|e| ImportError::Config(format!("Invalid request_cache_expiry: {e}")))?;

        Ok(ImportConfig {
            sqlite_database_filename: expand_tilde(&sqlite_database_filename),
            data_directory,
            request_cache_directory: settings.request_cache_directory.map(|d| expand_tilde(&d)),
            request_cache_expiry,
            user_agent: settings
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
