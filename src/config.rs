//! Run configuration
//!
//! Defaults, overridden by a suite document's `settings` block, overridden by
//! command-line flags.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Execution mode for the scenario runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Serial,
    Parallel,
}

/// Options that shape one suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunOptions {
    /// Serial or parallel scenario execution (default: serial)
    #[serde(default)]
    pub mode: RunMode,

    /// Maximum in-flight scenarios in parallel mode (default: 4)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Global suite deadline in milliseconds
    #[serde(default)]
    pub deadline_ms: Option<u64>,

    /// Per-request transport timeout in milliseconds
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_concurrency() -> usize {
    4
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            concurrency: default_concurrency(),
            deadline_ms: None,
            request_timeout_ms: None,
            headers: BTreeMap::new(),
        }
    }
}

impl RunOptions {
    /// Zero means no deadline.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Zero means no timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn concurrency(&self) -> usize {
        match self.mode {
            RunMode::Serial => 1,
            RunMode::Parallel => self.concurrency.max(1),
        }
    }

    /// Apply command-line overrides on top of these options.
    pub fn merge(mut self, overrides: &RunOverrides) -> Self {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if overrides.deadline_ms.is_some() {
            self.deadline_ms = overrides.deadline_ms;
        }
        if overrides.request_timeout_ms.is_some() {
            self.request_timeout_ms = overrides.request_timeout_ms;
        }
        self
    }
}

/// Values supplied on the command line; `None` keeps the suite's setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub mode: Option<RunMode>,
    pub concurrency: Option<usize>,
    pub deadline_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}
