//! Library error types.
//!
//! Loading itself never fails from the caller's point of view (missing
//! resources degrade to placeholders). These errors cover construction and
//! configuration only.

use std::io;

/// Invalid values in [`Config`](crate::Config).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache.max_memory_mb must be greater than zero")]
    ZeroMemory,

    #[error("cache.{field} must be greater than zero")]
    ZeroDivisor { field: &'static str },

    #[error("loader.recent_task_limit must be greater than zero")]
    ZeroTaskLimit,
}

/// Errors building a [`TaskLoader`](crate::TaskLoader).
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn loader thread: {0}")]
    Spawn(#[from] io::Error),
}
