//! Command-line interface parsing for Recipe Explorer
//!
//! This module handles parsing of CLI arguments using clap and resolves them
//! into the paths, TTL and API settings the application starts with.

use chrono::Duration;
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::DEFAULT_TTL_HOURS;
use crate::data::MEALDB_BASE_URL;

/// File name of the API response cache inside the data directory
pub const CACHE_FILE_NAME: &str = "cache.json";

/// File name of the favorites list inside the data directory
pub const FAVORITES_FILE_NAME: &str = "favorites.json";

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The cache lifetime must be a positive number of hours
    #[error("Invalid TTL: '{0}'. The cache TTL must be a positive number of hours in range")]
    InvalidTtl(i64),
}

/// Recipe Explorer - search recipes and keep a list of favorites
#[derive(Parser, Debug)]
#[command(name = "recipe-explorer")]
#[command(about = "Search TheMealDB recipes from the terminal, with an offline-tolerant cache")]
#[command(version)]
pub struct Cli {
    /// Directory holding cache.json and favorites.json
    ///
    /// Defaults to the platform data directory (e.g. ~/.local/share/recipe-explorer).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Hours a cached API response stays fresh
    #[arg(long, value_name = "HOURS", default_value_t = DEFAULT_TTL_HOURS, allow_negative_numbers = true)]
    pub ttl_hours: i64,

    /// Ignore fresh cache entries and always ask the API first
    ///
    /// Cached data is still used when the API is unreachable.
    #[arg(long)]
    pub refresh: bool,

    /// Base URL of the TheMealDB API
    #[arg(long, value_name = "URL", default_value = MEALDB_BASE_URL)]
    pub base_url: String,

    /// Increase log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Directory holding the cache and favorites files
    pub data_dir: PathBuf,
    /// Expiration window for cached API responses
    pub ttl: Duration,
    /// Whether every lookup bypasses fresh cache entries
    pub force_refresh: bool,
    /// Base URL of the remote API
    pub base_url: String,
    /// Number of -v flags given
    pub verbosity: u8,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
            force_refresh: false,
            base_url: MEALDB_BASE_URL.to_string(),
            verbosity: 0,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an argument value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let ttl = Some(cli.ttl_hours)
            .filter(|hours| *hours > 0)
            .and_then(Duration::try_hours)
            .ok_or(CliError::InvalidTtl(cli.ttl_hours))?;

        Ok(StartupConfig {
            data_dir: cli.data_dir.clone().unwrap_or_else(default_data_dir),
            ttl,
            force_refresh: cli.refresh,
            base_url: cli.base_url.clone(),
            verbosity: cli.verbose,
        })
    }

    /// Path of the API response cache file
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE_NAME)
    }

    /// Path of the favorites file
    pub fn favorites_path(&self) -> PathBuf {
        self.data_dir.join(FAVORITES_FILE_NAME)
    }

    /// Default log filter for the verbosity level
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// XDG data directory for the application, or `./data` without a home directory
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "recipe-explorer")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}
