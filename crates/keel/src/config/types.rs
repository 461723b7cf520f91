//! Cluster client configuration.

use crate::{ClusterError, fetcher::DEFAULT_FETCH_WORKERS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which topic queries are warmed during topic discovery.
///
/// Anything not selected is fetched on first use instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicPreload {
    /// Replica assignment plus leader/ISR state of every partition.
    pub partitions: bool,
    /// Per-topic configuration overrides.
    pub config: bool,
}

impl TopicPreload {
    pub fn all() -> Self {
        Self {
            partitions: true,
            config: true,
        }
    }

    pub fn none() -> Self {
        Self {
            partitions: false,
            config: false,
        }
    }
}

impl Default for TopicPreload {
    fn default() -> Self {
        Self {
            partitions: true,
            config: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Coordination service connect string, e.g. `zk1:2181,zk2:2181/kafka`.
    pub address: String,
    /// Handed to the connector as-is; no timeout is applied to individual calls.
    #[serde(default)]
    pub session_timeout_ms: Option<u64>,
    #[serde(default = "ClusterConfig::default_fetch_workers")]
    pub fetch_workers: usize,
    #[serde(default)]
    pub preload: TopicPreload,
}

impl ClusterConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            session_timeout_ms: None,
            fetch_workers: DEFAULT_FETCH_WORKERS,
            preload: TopicPreload::default(),
        }
    }

    pub fn with_fetch_workers(mut self, fetch_workers: usize) -> Self {
        self.fetch_workers = fetch_workers;
        self
    }

    pub fn with_preload(mut self, preload: TopicPreload) -> Self {
        self.preload = preload;
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.address.trim().is_empty() {
            return Err(ClusterError::ConfigFile {
                context: "address".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.fetch_workers == 0 {
            return Err(ClusterError::ConfigFile {
                context: "fetch_workers".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        if self.session_timeout_ms == Some(0) {
            return Err(ClusterError::ConfigFile {
                context: "session_timeout_ms".to_string(),
                reason: "must be a positive integer when set".to_string(),
            });
        }
        Ok(())
    }

    fn default_fetch_workers() -> usize {
        DEFAULT_FETCH_WORKERS
    }
}
