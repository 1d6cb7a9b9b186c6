//! CLI definitions for the recents loader
//!
//! The clap structure lives in the library, separate from main.rs, so xtask
//! can render man pages and the command reference from it.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

use crate::pressure::MemoryPressure;

/// Build clap styles for consistent CLI appearance.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "recents")]
#[command(about = "Recents task loader - background icon/thumbnail loading with bounded caches")]
#[command(
    long_about = "Recents task loader - inspect and exercise the background resource loader.

The loader keeps two byte-bounded LRU caches (icons and thumbnails) filled by a
single background worker, and trims them when the host reports memory pressure.

QUICK START:
    recents budget                      Show the derived cache budgets
    recents simulate --tasks 40         Run the loader against synthetic tasks
    recents config show                 Print the active configuration"
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Config file to use instead of ~/.config/recents-loader/config.toml
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. "warn", "debug", "recents_loader=trace")
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the icon and thumbnail cache budgets
    #[command(long_about = "Show the byte budgets derived from the configuration.

The thumbnail budget is max_memory / thumbnail_divisor and the icon budget is
thumbnail_budget / icon_divisor. Trim targets for each pressure tier are
listed as well.

EXAMPLE:
    recents budget")]
    Budget,

    /// Run the loader against a synthetic task list
    #[command(long_about = "Run the loader against an in-memory provider.

Builds N synthetic tasks, reloads, waits for the worker to drain the queue,
then applies any requested memory pressure levels in order and prints the
cache statistics after each step.

EXAMPLES:
    recents simulate
    recents simulate --tasks 60 --preload 20 --latency-ms 5
    recents simulate --pressure moderate --pressure critical")]
    Simulate(SimulateArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of synthetic tasks
    #[arg(long, default_value_t = 24)]
    pub tasks: u32,

    /// Tasks to preload (defaults to loader.preload_count)
    #[arg(long)]
    pub preload: Option<usize>,

    /// Icon size in bytes
    #[arg(long, default_value_t = 16 * 1024)]
    pub icon_bytes: usize,

    /// Thumbnail size in bytes
    #[arg(long, default_value_t = 512 * 1024)]
    pub thumbnail_bytes: usize,

    /// Every Nth task has no resolvable resources (0 = none)
    #[arg(long, default_value_t = 0)]
    pub missing_every: u32,

    /// Simulated provider latency per fetch
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    /// Memory pressure levels to apply after loading, in order
    #[arg(long = "pressure", value_name = "LEVEL")]
    pub pressure: Vec<MemoryPressure>,

    /// Give up waiting for the worker after this many milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration as TOML
    #[command(long_about = "Display the active configuration in TOML format.

EXAMPLE:
    recents config show")]
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file (refuses to overwrite)
    #[command(long_about = "Write the default configuration to the config file.

An existing file is left untouched unless --force is given.

EXAMPLE:
    recents config init
    recents config init --force")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
