//! Memory pressure tiers reported by the host.

use std::fmt;
use std::str::FromStr;

/// How aggressively the loader should shed memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryPressure {
    /// The consumer is no longer visible: stop loading, drop pending work
    UiHidden,
    /// Trim caches to half their budget
    Moderate,
    /// Trim caches to a quarter of their budget
    Low,
    /// Drop every cached entry
    Critical,
}

/// Raw trim levels as delivered by hosts that report numeric levels.
pub mod trim_level {
    pub const RUNNING_MODERATE: u32 = 5;
    pub const RUNNING_LOW: u32 = 10;
    pub const RUNNING_CRITICAL: u32 = 15;
    pub const UI_HIDDEN: u32 = 20;
    pub const BACKGROUND: u32 = 40;
    pub const MODERATE: u32 = 60;
    pub const COMPLETE: u32 = 80;
}

impl MemoryPressure {
    pub const ALL: [MemoryPressure; 4] = [
        MemoryPressure::UiHidden,
        MemoryPressure::Moderate,
        MemoryPressure::Low,
        MemoryPressure::Critical,
    ];

    /// Maps a numeric host trim level onto a tier. Unknown levels map to
    /// `None` and should be ignored.
    pub fn from_trim_level(level: u32) -> Option<Self> {
        use trim_level::*;
        match level {
            UI_HIDDEN => Some(Self::UiHidden),
            RUNNING_MODERATE | BACKGROUND => Some(Self::Moderate),
            RUNNING_LOW | MODERATE => Some(Self::Low),
            RUNNING_CRITICAL | COMPLETE => Some(Self::Critical),
            _ => None,
        }
    }

    /// Divisor applied to each cache budget, or `None` when the tier does
    /// not trim.
    pub fn trim_divisor(self) -> Option<usize> {
        match self {
            Self::UiHidden => None,
            Self::Moderate => Some(2),
            Self::Low => Some(4),
            Self::Critical => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UiHidden => "ui-hidden",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MemoryPressure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown memory pressure '{}' (expected ui-hidden, moderate, low or critical)",
                    s
                )
            })
    }
}
