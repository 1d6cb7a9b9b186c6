//! Command handlers for the recents CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod budget;
pub mod config;
pub mod simulate;

use anyhow::Result;
use std::path::Path;

use recents_loader::Config;

/// Load the config from `--config` if given, otherwise from the default
/// location (falling back to defaults when that file does not exist).
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Format a byte count the way every command prints sizes.
pub fn format_bytes(bytes: usize) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
