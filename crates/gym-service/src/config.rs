//! Club configuration: where the snapshot lives and how long to wait for it.
//!
//! Layering, lowest precedence first:
//! 1. built-in defaults
//! 2. TOML file (explicit path, or `.gym/config.toml` when present)
//! 3. `GYM_STORE_PATH` environment variable
//! 4. caller overrides (the CLI's `--store`)

use gym_store::{
    DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_RETRY_DELAY, DEFAULT_LOCK_STALE_AFTER, LockPolicy,
    SnapshotStore,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STORE_PATH: &str = ".gym/snapshot.jsonl";
pub const DEFAULT_CONFIG_PATH: &str = ".gym/config.toml";
pub const STORE_PATH_ENV: &str = "GYM_STORE_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    pub attempts: u32,
    pub retry_delay_ms: u64,
    /// A lock file older than this is treated as left behind by a dead writer.
    pub stale_after_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_LOCK_ATTEMPTS,
            retry_delay_ms: DEFAULT_LOCK_RETRY_DELAY.as_millis() as u64,
            stale_after_ms: DEFAULT_LOCK_STALE_AFTER.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClubConfig {
    pub store_path: PathBuf,
    pub lock: LockConfig,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            lock: LockConfig::default(),
        }
    }
}

impl ClubConfig {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file. A missing explicit file is an error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Resolve file and environment layers.
    ///
    /// With no explicit path, `.gym/config.toml` is used only if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        let config = config.with_env(|key| std::env::var(key).ok());
        tracing::debug!(
            store = %config.store_path.display(),
            attempts = config.lock.attempts,
            retry_delay_ms = config.lock.retry_delay_ms,
            stale_after_ms = config.lock.stale_after_ms,
            "configuration resolved"
        );
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(STORE_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.store_path = PathBuf::from(path);
        }
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.lock.attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "lock.attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.lock.stale_after_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "lock.stale_after_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            attempts: self.lock.attempts,
            retry_delay: Duration::from_millis(self.lock.retry_delay_ms),
            stale_after: Duration::from_millis(self.lock.stale_after_ms),
        }
    }

    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.store_path).with_lock_policy(self.lock_policy())
    }
}
