//! Recents Task Loader Library
//!
//! Loads per-task icons and thumbnails on a background thread into two
//! byte-bounded LRU caches, and sheds them under memory pressure.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod key;
pub mod loader;
pub mod pressure;
pub mod provider;
pub mod queue;
pub mod stack;
pub mod worker;

pub use cache::{BoundedResourceCache, CacheStats, ResourceSize};
pub use config::{CacheBudget, Config};
pub use error::{ConfigError, LoaderError};
pub use key::{TaskKey, Versioned};
pub use loader::{LoadOutcome, TaskLoader};
pub use pressure::MemoryPressure;
pub use provider::{Placeholders, ResourceProvider, ResultSink, TaskDescriptor};
pub use queue::LoadQueue;
pub use stack::{Task, TaskStack};
pub use worker::{ResourceLoaderWorker, WorkerState};
