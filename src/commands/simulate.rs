//! Simulate command handler
//!
//! Drives a real [`TaskLoader`] against the in-memory provider so budgets,
//! eviction and pressure handling can be observed from the shell.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use recents_loader::cli::SimulateArgs;
use recents_loader::provider::memory::{blank_placeholders, Bitmap, InMemoryProvider};
use recents_loader::{BoundedResourceCache, ResultSink, TaskKey, TaskLoader};

use super::{format_bytes, load_config};

/// Counts notifications for every task it is registered on.
#[derive(Clone, Default)]
struct CountingSink {
    loaded: Arc<AtomicUsize>,
    unloaded: Arc<AtomicUsize>,
}

impl ResultSink<Bitmap, Bitmap> for CountingSink {
    fn on_data_loaded(&self, _thumbnail: Arc<Bitmap>, _icon: Arc<Bitmap>) {
        self.loaded.fetch_add(1, Ordering::Relaxed);
    }

    fn on_data_unloaded(&self, _default_thumbnail: Arc<Bitmap>, _default_icon: Arc<Bitmap>) {
        self.unloaded.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(not(tarpaulin_include))]
pub fn handle(config_path: Option<&Path>, args: &SimulateArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let preload = args.preload.unwrap_or(config.loader.preload_count);

    let mut provider = InMemoryProvider::synthetic(
        args.tasks,
        args.icon_bytes,
        args.thumbnail_bytes,
        args.missing_every,
    );
    if args.latency_ms > 0 {
        provider = provider.with_latency(Duration::from_millis(args.latency_ms));
    }
    let provider = Arc::new(provider);

    let mut loader = TaskLoader::new(&config, Arc::clone(&provider), blank_placeholders())
        .context("Failed to create task loader")?;

    let sink = CountingSink::default();
    let keys: Vec<TaskKey> = loader.shallow_task_stack().keys();
    for key in &keys {
        loader.register_sink(*key, sink.clone());
    }

    let started = Instant::now();
    let stack = loader.reload(preload);
    let dispatched = loader.drain_until_idle(Duration::from_millis(args.timeout_ms));
    let elapsed = started.elapsed();

    println!(
        "Reloaded {} tasks (preload {}), {} completions in {:.1?}",
        stack.len(),
        preload,
        dispatched,
        elapsed
    );
    if let Some(task) = stack.foremost() {
        println!(
            "Foremost:   {} ({})",
            task.key,
            if task.has_resources() {
                "loaded synchronously"
            } else {
                "no resources"
            }
        );
    }
    println!(
        "Fetches:    {} icons, {} thumbnails",
        provider.icon_fetches(),
        provider.thumbnail_fetches()
    );
    print_cache(loader.icon_cache());
    print_cache(loader.thumbnail_cache());

    for level in &args.pressure {
        loader.on_memory_pressure(*level);
        println!();
        println!("After {} pressure:", level);
        print_cache(loader.icon_cache());
        print_cache(loader.thumbnail_cache());
    }

    // Unloading every task releases its sink with the default placeholders.
    for key in &keys {
        loader.unload_resource_data(key);
        loader.unregister_sink(key);
    }
    loader.stop_loader();

    println!();
    println!(
        "Sink notifications: {} loaded, {} unloaded",
        sink.loaded.load(Ordering::Relaxed),
        sink.unloaded.load(Ordering::Relaxed)
    );
    Ok(())
}

fn print_cache(cache: &BoundedResourceCache<TaskKey, Bitmap>) {
    let stats = cache.stats();
    println!(
        "  {:<10} {:>3} entries  {:>10} / {:<10} hits {} misses {} evictions {}",
        cache.name(),
        stats.len,
        format_bytes(stats.size),
        format_bytes(stats.capacity),
        stats.hits,
        stats.misses,
        stats.evictions
    );
}
