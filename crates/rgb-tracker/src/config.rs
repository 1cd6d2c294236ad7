//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`TrackerConfig::section_capacity`].
pub const ENV_SECTION_CAPACITY: &str = "RGB_TRACKER_SECTION_CAPACITY";
/// Environment variable overriding [`TrackerConfig::listener_capacity`].
pub const ENV_LISTENER_CAPACITY: &str = "RGB_TRACKER_LISTENER_CAPACITY";
/// Environment variable overriding [`TrackerConfig::exact_position_events`].
pub const ENV_EXACT_POSITION: &str = "RGB_TRACKER_EXACT_POSITION";

/// Tuning knobs for an [`EntityTrackerEngine`](crate::EntityTrackerEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Initial capacity of the section map.
    pub section_capacity: usize,
    /// Initial capacity of the listener table.
    pub listener_capacity: usize,
    /// Dispatch within-section movement to exact-position listeners.
    pub exact_position_events: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            section_capacity: 256,
            listener_capacity: 64,
            exact_position_events: true,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `RGB_TRACKER_*` environment variables.
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            section_capacity: lookup(ENV_SECTION_CAPACITY)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.section_capacity),
            listener_capacity: lookup(ENV_LISTENER_CAPACITY)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.listener_capacity),
            exact_position_events: lookup(ENV_EXACT_POSITION)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.exact_position_events),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
