//! Budget command handler

use anyhow::Result;
use std::path::Path;

use recents_loader::MemoryPressure;

use super::{format_bytes, load_config};

/// Print the cache budgets and the trim targets of each pressure tier.
#[cfg(not(tarpaulin_include))]
pub fn handle(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let budget = config.budget();

    println!(
        "Memory:     {}",
        format_bytes(usize::try_from(config.cache.max_memory_mb)? * 1024 * 1024)
    );
    println!("Thumbnails: {}", format_bytes(budget.thumbnail_bytes));
    println!("Icons:      {}", format_bytes(budget.icon_bytes));
    if config.cache.disable_background_cache {
        println!("(background cache disabled)");
    }
    println!();
    println!("Pressure targets:");
    for level in MemoryPressure::ALL {
        let target = match level.trim_divisor() {
            Some(divisor) => {
                let scaled = config.trim_budget().scaled(divisor);
                format!(
                    "thumbnails {} / icons {}",
                    format_bytes(scaled.thumbnail_bytes),
                    format_bytes(scaled.icon_bytes)
                )
            }
            None if level == MemoryPressure::Critical => "evict everything".to_string(),
            None => "stop loader, clear queue".to_string(),
        };
        println!("  {:<10} {}", level, target);
    }
    Ok(())
}
