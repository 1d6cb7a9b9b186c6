//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Cache sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Memory the budgets are carved from, in MiB
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: u64,
    /// Thumbnail budget is `max_memory / thumbnail_divisor`
    #[serde(default = "default_thumbnail_divisor")]
    pub thumbnail_divisor: u64,
    /// Icon budget is `thumbnail_budget / icon_divisor`
    #[serde(default = "default_icon_divisor")]
    pub icon_divisor: u64,
    /// Debug switch: shrink both budgets to a single byte
    #[serde(default)]
    pub disable_background_cache: bool,
}

pub fn default_max_memory_mb() -> u64 {
    256
}

pub fn default_thumbnail_divisor() -> u64 {
    6
}

pub fn default_icon_divisor() -> u64 {
    5
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: default_max_memory_mb(),
            thumbnail_divisor: default_thumbnail_divisor(),
            icon_divisor: default_icon_divisor(),
            disable_background_cache: false,
        }
    }
}

/// Task listing and preloading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// How many recent tasks `reload` asks the provider for
    #[serde(default = "default_recent_task_limit")]
    pub recent_task_limit: usize,
    /// How many of the most recent tasks `reload` preloads
    #[serde(default = "default_preload_count")]
    pub preload_count: usize,
}

pub fn default_recent_task_limit() -> usize {
    50
}

pub fn default_preload_count() -> usize {
    10
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            recent_task_limit: default_recent_task_limit(),
            preload_count: default_preload_count(),
        }
    }
}

/// Byte budgets for the two caches, fixed when the loader is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheBudget {
    pub icon_bytes: usize,
    pub thumbnail_bytes: usize,
}

impl CacheBudget {
    /// Capacities the caches are built with. `disable_background_cache`
    /// shrinks both to a single byte.
    pub fn from_config(config: &CacheConfig) -> Self {
        if config.disable_background_cache {
            return Self {
                icon_bytes: 1,
                thumbnail_bytes: 1,
            };
        }
        Self::nominal(config)
    }

    /// Budgets carved from `max_memory_mb`, ignoring
    /// `disable_background_cache`. Memory pressure trims against these.
    pub fn nominal(config: &CacheConfig) -> Self {
        let max_memory = config.max_memory_mb.saturating_mul(1024 * 1024);
        let thumbnail = max_memory / config.thumbnail_divisor.max(1);
        let icon = thumbnail / config.icon_divisor.max(1);
        Self {
            icon_bytes: usize::try_from(icon).unwrap_or(usize::MAX),
            thumbnail_bytes: usize::try_from(thumbnail).unwrap_or(usize::MAX),
        }
    }

    pub fn scaled(&self, divisor: usize) -> Self {
        Self {
            icon_bytes: self.icon_bytes / divisor.max(1),
            thumbnail_bytes: self.thumbnail_bytes / divisor.max(1),
        }
    }
}

impl Config {
    /// Reject values that would produce empty budgets or listings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_memory_mb == 0 {
            return Err(ConfigError::ZeroMemory);
        }
        if self.cache.thumbnail_divisor == 0 {
            return Err(ConfigError::ZeroDivisor {
                field: "thumbnail_divisor",
            });
        }
        if self.cache.icon_divisor == 0 {
            return Err(ConfigError::ZeroDivisor {
                field: "icon_divisor",
            });
        }
        if self.loader.recent_task_limit == 0 {
            return Err(ConfigError::ZeroTaskLimit);
        }
        Ok(())
    }

    pub fn budget(&self) -> CacheBudget {
        CacheBudget::from_config(&self.cache)
    }

    /// Reference budget for pressure trimming.
    pub fn trim_budget(&self) -> CacheBudget {
        CacheBudget::nominal(&self.cache)
    }
}
