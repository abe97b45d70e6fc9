//! Engine configuration.
//!
//! Loaded from `config.toml` in the data directory. Every field has a
//! default, so a missing file or a partial file both work.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use voicematch_rules::{PenaltyAccumulator, QuotaTracker};
use voicematch_types::{
    Tier, CYCLE_WINDOW_MS, FREE_TIER_LIMIT, LOCK_THRESHOLD, PLUS_TIER_LIMIT, PREMIUM_TIER_LIMIT,
};

use crate::error::{EngineError, Result};
use crate::retry::RetryPolicy;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "VOICEMATCH_DATA_DIR";

/// Accepted values for `logging.log_level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Quota window and tier limits.
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Report lock threshold.
    #[serde(default)]
    pub penalty: PenaltyConfig,
    /// Conflict retry bounds.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Quota configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Rolling cycle length in seconds.
    #[serde(default = "default_cycle_window_secs")]
    pub cycle_window_secs: u64,
    #[serde(default = "default_free_limit")]
    pub free_limit: u32,
    #[serde(default = "default_plus_limit")]
    pub plus_limit: u32,
    #[serde(default = "default_premium_limit")]
    pub premium_limit: u32,
}

/// Penalty configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// Report count at which an account locks.
    #[serde(default = "default_lock_threshold")]
    pub lock_threshold: u32,
}

/// Retry configuration for conflicted writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_cycle_window_secs() -> u64 {
    CYCLE_WINDOW_MS / 1000
}

fn default_free_limit() -> u32 {
    FREE_TIER_LIMIT
}

fn default_plus_limit() -> u32 {
    PLUS_TIER_LIMIT
}

fn default_premium_limit() -> u32 {
    PREMIUM_TIER_LIMIT
}

fn default_lock_threshold() -> u32 {
    LOCK_THRESHOLD
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    10
}

fn default_max_backoff_ms() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            cycle_window_secs: default_cycle_window_secs(),
            free_limit: default_free_limit(),
            plus_limit: default_plus_limit(),
            premium_limit: default_premium_limit(),
        }
    }
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            lock_threshold: default_lock_threshold(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl QuotaConfig {
    /// Per-cycle limit for a tier.
    pub fn limit_for(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => self.free_limit,
            Tier::Plus => self.plus_limit,
            Tier::Premium => self.premium_limit,
        }
    }

    pub fn tracker(&self) -> QuotaTracker {
        QuotaTracker::new(self.cycle_window_secs.saturating_mul(1000))
    }
}

impl PenaltyConfig {
    pub fn accumulator(&self) -> PenaltyAccumulator {
        PenaltyAccumulator::new(self.lock_threshold)
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the rules cannot work with.
    pub fn validate(&self) -> Result<()> {
        let q = &self.quota;
        if q.cycle_window_secs == 0 {
            return Err(EngineError::Config("quota.cycle_window_secs must be > 0".into()));
        }
        for (name, limit) in [
            ("free_limit", q.free_limit),
            ("plus_limit", q.plus_limit),
            ("premium_limit", q.premium_limit),
        ] {
            if limit == 0 {
                return Err(EngineError::Config(format!("quota.{name} must be > 0")));
            }
        }
        if self.penalty.lock_threshold == 0 {
            return Err(EngineError::Config("penalty.lock_threshold must be > 0".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(EngineError::Config("retry.max_attempts must be > 0".into()));
        }
        if !LOG_LEVELS.contains(&self.logging.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "logging.log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.log_level
            )));
        }
        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Path of the SQLite database inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("voicematch.db")
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/VoiceMatch")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("VoiceMatch")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".voicematch")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/voicematch"))
}
