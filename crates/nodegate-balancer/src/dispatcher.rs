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

//! First-fit dispatch with fixed-delay retry.

use crate::forwarder::{Forwarder, LoggingForwarder};
use crate::node::Node;
use crate::shutdown::Shutdown;
use nodegate_common::{ForwardRequest, GateError, Result, RetryConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Selects an admissible node for each request.
///
/// Nodes are scanned in their configured order and the first one whose
/// admission gate accepts the cost wins, so early nodes are preferred
/// whenever they have capacity. When a whole scan fails the dispatcher
/// waits `backoff` and scans again, up to `max_retries` more times.
///
/// The dispatcher never touches node counters itself; all mutation goes
/// through [`Node::allow_request`].
pub struct Dispatcher {
    nodes: Arc<[Arc<Node>]>,
    retry_config: RetryConfig,
    forwarder: Arc<dyn Forwarder>,
    shutdown: Shutdown,
    scans: AtomicU64,
}

impl Dispatcher {
    /// Creates a dispatcher with the logging forwarder and no shutdown signal.
    pub fn new(nodes: Arc<[Arc<Node>]>, retry_config: RetryConfig) -> Self {
        Self {
            nodes,
            retry_config,
            forwarder: Arc::new(LoggingForwarder),
            shutdown: Shutdown::never(),
            scans: AtomicU64::new(0),
        }
    }

    pub fn with_forwarder(mut self, forwarder: Arc<dyn Forwarder>) -> Self {
        self.forwarder = forwarder;
        self
    }

    /// Lets a shutdown cut a retry backoff short.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Total pool scans performed since creation, successful or not.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// One pass over the pool in list order.
    fn scan(&self, cost: u64) -> Option<&Arc<Node>> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.nodes.iter().find(|node| node.allow_request(cost))
    }

    /// Finds a node that admits `cost`, retrying with a fixed backoff.
    ///
    /// # Returns
    /// - `Ok(node)` - the node whose window was charged for this request
    /// - `Err(GateError::CapacityExhausted)` - every scan failed, or shutdown
    ///   was triggered before or while waiting between scans
    pub async fn select(&self, cost: u64) -> Result<Arc<Node>> {
        let attempts = self.retry_config.attempts();
        let backoff = self.retry_config.backoff();
        let mut shutdown = self.shutdown.clone();

        for attempt in 0..attempts {
            if let Some(node) = self.scan(cost) {
                debug!(
                    "Admitted request (cost {}) on {} (attempt {}/{})",
                    cost,
                    node.address(),
                    attempt + 1,
                    attempts
                );
                return Ok(node.clone());
            }

            if attempt + 1 == attempts {
                break;
            }

            if shutdown.is_triggered() {
                debug!("Shutdown already triggered, not retrying request");
                return Err(GateError::CapacityExhausted);
            }

            debug!(
                "No node admitted request (cost {}) on attempt {}/{}, retrying in {}ms",
                cost,
                attempt + 1,
                attempts,
                backoff.as_millis()
            );

            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                _ = shutdown.triggered() => {
                    debug!("Shutdown during retry backoff, giving up on request");
                    return Err(GateError::CapacityExhausted);
                }
            }
        }

        warn!(
            "All nodes are at capacity after {} attempts (cost {})",
            attempts, cost
        );
        Err(GateError::CapacityExhausted)
    }

    /// Selects a node for `request` and hands the request to the forwarder.
    pub async fn dispatch(&self, request: &ForwardRequest, cost: u64) -> Result<Arc<Node>> {
        let node = self.select(cost).await?;
        self.forwarder.forward(&node, request);
        Ok(node)
    }
}
