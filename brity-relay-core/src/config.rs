//! 存储配置

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the accounts file location
pub const ENV_ACCOUNTS_FILE: &str = "BRITY_RELAY_ACCOUNTS_FILE";
/// Environment variable overriding the lock timeout, in milliseconds
pub const ENV_LOCK_TIMEOUT_MS: &str = "BRITY_RELAY_LOCK_TIMEOUT_MS";

const APP_DIR_NAME: &str = "brity-relay";
const STORE_FILE_NAME: &str = "accounts.json";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);
const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Settings for the JSON file account store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Canonical accounts file
    pub path: PathBuf,
    /// Longest a mutation waits for the exclusive lock before reporting `StoreBusy`
    pub lock_timeout: Duration,
    /// Pause between lock attempts
    pub lock_retry_interval: Duration,
    /// Files larger than this are treated as unreadable
    pub max_file_size: u64,
}

impl StoreConfig {
    /// Default settings with the accounts file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_retry_interval: DEFAULT_LOCK_RETRY_INTERVAL,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Defaults overlaid with `BRITY_RELAY_ACCOUNTS_FILE` / `BRITY_RELAY_LOCK_TIMEOUT_MS`.
    ///
    /// An unparseable timeout value is ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = std::env::var_os(ENV_ACCOUNTS_FILE).filter(|p| !p.is_empty()) {
            config.path = PathBuf::from(path);
        }

        if let Ok(raw) = std::env::var(ENV_LOCK_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.lock_timeout = Duration::from_millis(ms),
                Err(e) => log::warn!("Ignoring {ENV_LOCK_TIMEOUT_MS}={raw:?}: {e}"),
            }
        }

        config
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_lock_retry_interval(mut self, interval: Duration) -> Self {
        self.lock_retry_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sibling file that carries the exclusive lock.
    ///
    /// The canonical file is replaced by rename on every commit, so it cannot
    /// hold the lock itself.
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    /// Sibling file that receives the next snapshot before it is renamed into place.
    pub fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(default_store_path())
    }
}

/// `<config dir>/brity-relay/accounts.json`, or `./accounts.json` when the
/// platform has no config directory.
pub fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_FILE_NAME)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
