//! Driver configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration consumed by the resolution driver.
///
/// Hosts usually build this programmatically when installing the middleware,
/// but it also deserializes from whatever config file the host keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockOptions {
    /// Path to the route table file: a JSON object mapping route patterns to
    /// destinations, re-read on every request.
    pub map: PathBuf,

    /// Artificial latency in milliseconds applied before a fixture response
    /// is emitted. Simulates backend latency so the frontend's loading
    /// states stay honest. Forwarded requests are never delayed.
    #[serde(default = "default_delay_ms")]
    pub delay: u64,
}

fn default_delay_ms() -> u64 {
    1000
}

impl MockOptions {
    /// Options for the given map file, with the default 1000 ms delay.
    pub fn new(map: impl Into<PathBuf>) -> Self {
        Self {
            map: map.into(),
            delay: default_delay_ms(),
        }
    }

    /// Replace the artificial delay.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = delay_ms;
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.map.as_os_str().is_empty() {
            anyhow::bail!("map path cannot be empty");
        }
        Ok(())
    }
}
