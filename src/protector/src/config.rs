//! Engine configuration
//!
//! A process-wide [`ProtectorConfig`] is read at the start of every
//! evaluation. Rule sets may carry their own copy which takes precedence.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable consulted by [`ProtectorConfig::from_env`]
pub const PARANOID_ENV: &str = "PROTECTOR_PARANOID";

static GLOBAL: Lazy<RwLock<ProtectorConfig>> =
    Lazy::new(|| RwLock::new(ProtectorConfig::default()));

/// Engine configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectorConfig {
    /// Report every boundary as scoped, even when no rule called `scope`
    pub paranoid: bool,
}

impl ProtectorConfig {
    /// Create a configuration with defaults (paranoid mode off)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set paranoid mode
    pub fn with_paranoid(mut self, paranoid: bool) -> Self {
        self.paranoid = paranoid;
        self
    }

    /// Build a configuration from the process environment
    ///
    /// `PROTECTOR_PARANOID` accepts `1`, `true`, `yes` or `on` (any case).
    /// Unset or any other value leaves paranoid mode off.
    pub fn from_env() -> Self {
        let paranoid = std::env::var(PARANOID_ENV)
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        Self { paranoid }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Snapshot of the process-wide configuration
pub fn global() -> ProtectorConfig {
    *GLOBAL.read()
}

/// Replace the process-wide configuration
pub fn set_global(config: ProtectorConfig) {
    debug!(paranoid = config.paranoid, "Updating global protector configuration");
    *GLOBAL.write() = config;
}

/// Mutate the process-wide configuration in place
pub fn configure<F>(f: F)
where
    F: FnOnce(&mut ProtectorConfig),
{
    let mut guard = GLOBAL.write();
    f(&mut *guard);
    debug!(paranoid = guard.paranoid, "Updated global protector configuration");
}
