// Copyright 2025 Nodegate Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pool configuration.
//!
//! The node pool is static: it is read once at startup, validated, and never
//! changed while the process runs. Retry and schedule sections are optional
//! and fall back to their defaults.

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Static description of one backend node.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node URL, e.g. `http://node1.example.com`
    pub address: String,
    /// Opaque credential handed to the forwarder untouched
    pub credential: String,
    /// Maximum admitted requests per window
    pub max_requests_per_window: u64,
    /// Maximum admitted bytes per window
    pub max_bytes_per_window: u64,
}

impl NodeConfig {
    pub fn new(
        address: impl Into<String>,
        credential: impl Into<String>,
        max_requests_per_window: u64,
        max_bytes_per_window: u64,
    ) -> Self {
        Self {
            address: address.into(),
            credential: credential.into(),
            max_requests_per_window,
            max_bytes_per_window,
        }
    }

    /// Checks the limits and address of a single node.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(GateError::InvalidConfig(
                "node address must not be empty".to_string(),
            ));
        }
        if self.max_requests_per_window == 0 {
            return Err(GateError::InvalidConfig(format!(
                "node {}: max_requests_per_window must be positive",
                self.address
            )));
        }
        if self.max_bytes_per_window == 0 {
            return Err(GateError::InvalidConfig(format!(
                "node {}: max_bytes_per_window must be positive",
                self.address
            )));
        }
        Ok(())
    }
}

// The credential never shows up in logs.
impl fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConfig")
            .field("address", &self.address)
            .field("credential", &"<redacted>")
            .field("max_requests_per_window", &self.max_requests_per_window)
            .field("max_bytes_per_window", &self.max_bytes_per_window)
            .finish()
    }
}

/// Retry policy for dispatch.
///
/// A request is scanned against the pool `max_retries + 1` times. Between
/// two scans the dispatcher waits a fixed `backoff_ms`, with no jitter and
/// no growth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (excluding initial attempt)
    ///
    /// Default: 3
    pub max_retries: usize,
    /// Fixed wait between attempts in milliseconds
    ///
    /// Default: 1000ms
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Total number of scans a request may perform.
    pub fn attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Cadences of the two background tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Length of a capacity window in milliseconds
    ///
    /// Default: 60000ms (1 minute)
    pub window_ms: u64,
    /// Interval between usage reports in milliseconds
    ///
    /// Default: 10000ms (10 seconds)
    pub report_interval_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            report_interval_ms: 10_000,
        }
    }
}

impl ScheduleConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

/// Complete balancer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancerConfig {
    /// Ordered node pool; order defines scan priority
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl BalancerConfig {
    /// Creates a configuration with default retry and schedule settings.
    pub fn new(nodes: Vec<NodeConfig>) -> Self {
        Self {
            nodes,
            retry: RetryConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }

    /// The two-node demonstration pool.
    pub fn sample() -> Self {
        Self::new(vec![
            NodeConfig::new("http://node1.example.com", "123456789", 10, 100),
            NodeConfig::new("http://node2.example.com", "412412312", 5, 50),
        ])
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    /// Parses a JSON document. The result is not validated.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file. The result is not validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Rejects configurations that must never reach a live pool.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(GateError::InvalidConfig(
                "node pool must contain at least one node".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            node.validate()?;
            if !seen.insert(node.address.as_str()) {
                return Err(GateError::InvalidConfig(format!(
                    "duplicate node address: {}",
                    node.address
                )));
            }
        }

        if self.schedule.window_ms == 0 {
            return Err(GateError::InvalidConfig(
                "window_ms must be positive".to_string(),
            ));
        }
        if self.schedule.report_interval_ms == 0 {
            return Err(GateError::InvalidConfig(
                "report_interval_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
