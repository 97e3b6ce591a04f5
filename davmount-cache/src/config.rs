use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::store::default_db_path;

const DEFAULT_ROOT_TITLE: &str = "WebDAV";
const DEFAULT_MAX_NAME_ATTEMPTS: u32 = 5;
const DEFAULT_MAX_TREE_DEPTH: usize = 256;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("XDG data directory is unavailable; set DAVMOUNT_DB")]
    MissingDataDir,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub database_path: PathBuf,
    /// Title shown for every root, the mount name becomes the summary.
    pub root_title: String,
    /// Candidate member names tried per rename or create.
    pub max_name_attempts: u32,
    /// Upper bound on parent hops when walking towards a root.
    pub max_tree_depth: usize,
    pub http_timeout: Duration,
}

impl CacheConfig {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            database_path,
            root_title: DEFAULT_ROOT_TITLE.to_string(),
            max_name_attempts: DEFAULT_MAX_NAME_ATTEMPTS,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let database_path = match std::env::var("DAVMOUNT_DB") {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
            _ => default_db_path().ok_or(ConfigError::MissingDataDir)?,
        };
        let root_title = std::env::var("DAVMOUNT_ROOT_TITLE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROOT_TITLE.to_string());
        let max_name_attempts = read_u64_env(
            "DAVMOUNT_MAX_NAME_ATTEMPTS",
            u64::from(DEFAULT_MAX_NAME_ATTEMPTS),
        )
        .clamp(1, u64::from(u32::MAX)) as u32;
        let max_tree_depth =
            read_u64_env("DAVMOUNT_MAX_TREE_DEPTH", DEFAULT_MAX_TREE_DEPTH as u64).max(1) as usize;
        let http_timeout = Duration::from_secs(read_u64_env(
            "DAVMOUNT_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        ));

        Ok(Self {
            database_path,
            root_title,
            max_name_attempts,
            max_tree_depth,
            http_timeout,
        })
    }
}

fn read_u64_env(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
