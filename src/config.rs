//! Configuration Module
//!
//! Startup configuration from environment variables, plus the settings
//! provider the caches consult on every call.

use std::env;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default cache TTL in seconds (10 minutes)
pub const DEFAULT_TTL_SECONDS: u64 = 600;

/// Log filter used when `RUST_LOG` is not set. Cache events are emitted at
/// `info` while the `debug` setting is on, so this filter shows them.
pub const DEFAULT_LOG_FILTER: &str = "lookup_cache=info,tower_http=info";

// == Loading Mode ==
/// Strategy used to populate a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingMode {
    /// Whole collection loaded at once, one shared expiry
    #[default]
    Eager,
    /// Per-id entries loaded on demand, each with its own expiry
    Lazy,
}

impl FromStr for LoadingMode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(LoadingMode::Eager),
            "lazy" => Ok(LoadingMode::Lazy),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown loading mode '{}', expected 'eager' or 'lazy'",
                other
            ))),
        }
    }
}

impl fmt::Display for LoadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadingMode::Eager => f.write_str("eager"),
            LoadingMode::Lazy => f.write_str("lazy"),
        }
    }
}

// == Cache Settings ==
/// Settings read by a cache at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Time-to-live in seconds for loaded data
    pub ttl_seconds: u64,
    /// Loading strategy
    pub loading_mode: LoadingMode,
    /// Emit hit/miss/refresh/invalidation events
    pub debug: bool,
}

impl CacheSettings {
    /// TTL in milliseconds.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_seconds.saturating_mul(1000)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            loading_mode: LoadingMode::Eager,
            debug: false,
        }
    }
}

// == Settings Provider ==
/// Source of cache settings, consulted on every cache operation.
///
/// Changing what a provider returns takes effect on the next call.
pub trait SettingsProvider: Send + Sync {
    fn current(&self) -> CacheSettings;
}

/// Fixed settings.
impl SettingsProvider for CacheSettings {
    fn current(&self) -> CacheSettings {
        *self
    }
}

/// Partial settings update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    #[serde(default)]
    pub loading_mode: Option<LoadingMode>,
    #[serde(default)]
    pub debug: Option<bool>,
}

/// Settings that can be changed while the process runs.
#[derive(Debug, Default)]
pub struct RuntimeSettings {
    inner: RwLock<CacheSettings>,
}

impl RuntimeSettings {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Sets the TTL. Zero is rejected.
    pub fn set_ttl_seconds(&self, ttl_seconds: u64) -> Result<()> {
        validate_ttl(ttl_seconds)?;
        self.inner.write().ttl_seconds = ttl_seconds;
        Ok(())
    }

    pub fn set_loading_mode(&self, mode: LoadingMode) {
        self.inner.write().loading_mode = mode;
    }

    pub fn set_debug(&self, debug: bool) {
        self.inner.write().debug = debug;
    }

    /// Applies a partial update atomically and returns the resulting settings.
    ///
    /// Nothing is applied when the update is invalid.
    pub fn apply(&self, update: &SettingsUpdate) -> Result<CacheSettings> {
        if let Some(ttl) = update.ttl_seconds {
            validate_ttl(ttl)?;
        }

        let mut guard = self.inner.write();
        if let Some(ttl) = update.ttl_seconds {
            guard.ttl_seconds = ttl;
        }
        if let Some(mode) = update.loading_mode {
            guard.loading_mode = mode;
        }
        if let Some(debug) = update.debug {
            guard.debug = debug;
        }
        Ok(*guard)
    }
}

impl SettingsProvider for RuntimeSettings {
    fn current(&self) -> CacheSettings {
        *self.inner.read()
    }
}

fn validate_ttl(ttl_seconds: u64) -> Result<()> {
    if ttl_seconds == 0 {
        return Err(CacheError::InvalidRequest(
            "TTL must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}

// == Server Config ==
/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial cache settings
    pub cache: CacheSettings,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 600)
    /// - `CACHE_LOADING_MODE` - `eager` or `lazy` (default: eager)
    /// - `CACHE_DEBUG` - Log cache events (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache: CacheSettings {
                ttl_seconds: env::var("CACHE_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|ttl| *ttl > 0)
                    .unwrap_or(defaults.cache.ttl_seconds),
                loading_mode: env::var("CACHE_LOADING_MODE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.cache.loading_mode),
                debug: env::var("CACHE_DEBUG")
                    .ok()
                    .map(|v| parse_flag(&v))
                    .unwrap_or(defaults.cache.debug),
            },
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            server_port: 3000,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
