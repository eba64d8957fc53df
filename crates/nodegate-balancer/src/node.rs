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

//! Per-node admission gate.
//!
//! A [`Node`] owns two capacity dimensions (admitted requests and admitted
//! bytes per window) plus lifetime totals. Every read and write of those
//! counters goes through the node's own mutex, so operations on different
//! nodes never contend.

use nodegate_common::{GateError, NodeConfig, NodeSnapshot, Result};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters guarded by the node lock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counters {
    window_requests: u64,
    window_bytes: u64,
    total_requests: u64,
    total_bytes: u64,
}

/// A backend node with fixed per-window capacity limits.
pub struct Node {
    address: String,
    credential: String,
    max_requests: u64,
    max_bytes: u64,
    counters: Mutex<Counters>,
}

impl Node {
    /// Creates a node with zeroed counters.
    ///
    /// # Errors
    /// `GateError::InvalidConfig` if either limit is zero.
    pub fn new(
        address: impl Into<String>,
        credential: impl Into<String>,
        max_requests: u64,
        max_bytes: u64,
    ) -> Result<Self> {
        let address = address.into();
        if max_requests == 0 || max_bytes == 0 {
            return Err(GateError::InvalidConfig(format!(
                "node {}: capacity limits must be positive (requests={}, bytes={})",
                address, max_requests, max_bytes
            )));
        }

        Ok(Self {
            address,
            credential: credential.into(),
            max_requests,
            max_bytes,
            counters: Mutex::new(Counters::default()),
        })
    }

    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.address.clone(),
            config.credential.clone(),
            config.max_requests_per_window,
            config.max_bytes_per_window,
        )
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Opaque credential for the forwarder. Admission never looks at it.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    // A panic while holding the lock cannot leave the counters half-updated:
    // every mutation below is a plain store after all checks have passed.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits a request of `cost` bytes if both window limits allow it.
    ///
    /// The check and the update happen under one lock acquisition. A request
    /// that lands exactly on a limit is admitted; one that would cross it is
    /// rejected and leaves every counter untouched.
    pub fn allow_request(&self, cost: u64) -> bool {
        let mut counters = self.lock();

        let requests = match counters.window_requests.checked_add(1) {
            Some(n) if n <= self.max_requests => n,
            _ => return false,
        };
        let bytes = match counters.window_bytes.checked_add(cost) {
            Some(n) if n <= self.max_bytes => n,
            _ => return false,
        };

        counters.window_requests = requests;
        counters.window_bytes = bytes;
        counters.total_requests = counters.total_requests.saturating_add(1);
        counters.total_bytes = counters.total_bytes.saturating_add(cost);
        true
    }

    /// Zeroes the current-window counters. Lifetime totals are kept.
    pub fn reset_counts(&self) {
        let mut counters = self.lock();
        counters.window_requests = 0;
        counters.window_bytes = 0;
    }

    /// Copies all counters under a single lock acquisition.
    pub fn snapshot(&self) -> NodeSnapshot {
        let counters = *self.lock();
        NodeSnapshot {
            address: self.address.clone(),
            max_requests_per_window: self.max_requests,
            max_bytes_per_window: self.max_bytes,
            window_requests: counters.window_requests,
            window_bytes: counters.window_bytes,
            total_requests: counters.total_requests,
            total_bytes: counters.total_bytes,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("address", &self.address)
            .field("max_requests", &self.max_requests)
            .field("max_bytes", &self.max_bytes)
            .field("counters", &*self.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(max_requests: u64, max_bytes: u64) -> Node {
        Node::new("http://node1.example.com", "key", max_requests, max_bytes).unwrap()
    }

    #[test]
    fn test_node_creation() {
        let node = node(10, 100);
        assert_eq!(node.address(), "http://node1.example.com");
        assert_eq!(node.credential(), "key");
        assert_eq!(node.max_requests(), 10);
        assert_eq!(node.max_bytes(), 100);

        let snapshot = node.snapshot();
        assert_eq!(snapshot.window_requests, 0);
        assert_eq!(snapshot.window_bytes, 0);
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.total_bytes, 0);
    }

    #[test]
    fn test_node_rejects_zero_limits() {
        assert!(matches!(
            Node::new("a", "k", 0, 10),
            Err(GateError::InvalidConfig(_))
        ));
        assert!(matches!(
            Node::new("a", "k", 10, 0),
            Err(GateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_node_from_config() {
        let config = NodeConfig::new("http://node2.example.com", "412412312", 5, 50);
        let node = Node::from_config(&config).unwrap();
        assert_eq!(node.address(), "http://node2.example.com");
        assert_eq!(node.max_requests(), 5);
        assert_eq!(node.max_bytes(), 50);

        let bad = NodeConfig::new("", "k", 5, 50);
        assert!(Node::from_config(&bad).is_err());
    }

    #[test]
    fn test_request_count_limit() {
        let node = node(5, 100);
        for _ in 0..5 {
            assert!(node.allow_request(10));
        }
        let snapshot = node.snapshot();
        assert_eq!(snapshot.window_requests, 5);
        assert_eq!(snapshot.window_bytes, 50);

        // bytes headroom remains, request count does not
        assert!(!node.allow_request(10));
        assert_eq!(node.snapshot(), snapshot);
    }

    #[test]
    fn test_byte_limit() {
        let node = node(10, 20);
        assert!(node.allow_request(15));
        assert!(!node.allow_request(10));

        let snapshot = node.snapshot();
        assert_eq!(snapshot.window_requests, 1);
        assert_eq!(snapshot.window_bytes, 15);
    }

    #[test]
    fn test_exact_boundary_is_admitted() {
        let node = node(2, 20);
        assert!(node.allow_request(10));
        assert!(node.allow_request(10));
        assert!(!node.allow_request(0));
    }

    #[test]
    fn test_zero_cost_counts_as_request() {
        let node = node(1, 1);
        assert!(node.allow_request(0));
        assert!(!node.allow_request(0));
        assert_eq!(node.snapshot().total_requests, 1);
        assert_eq!(node.snapshot().total_bytes, 0);
    }

    #[test]
    fn test_cost_larger_than_limit_never_admitted() {
        let node = node(10, 100);
        assert!(!node.allow_request(101));
        assert!(!node.allow_request(u64::MAX));
        assert_eq!(node.snapshot().window_requests, 0);
    }

    #[test]
    fn test_overflowing_cost_is_rejected() {
        let node = node(10, u64::MAX);
        assert!(node.allow_request(u64::MAX - 1));
        assert!(!node.allow_request(2));
        assert_eq!(node.snapshot().window_bytes, u64::MAX - 1);
    }

    #[test]
    fn test_reset_keeps_lifetime_totals() {
        let node = node(2, 100);
        assert!(node.allow_request(30));
        assert!(node.allow_request(40));
        node.reset_counts();

        let snapshot = node.snapshot();
        assert_eq!(snapshot.window_requests, 0);
        assert_eq!(snapshot.window_bytes, 0);
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.total_bytes, 70);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let node = node(2, 100);
        node.reset_counts();
        let before = node.snapshot();
        node.reset_counts();
        assert_eq!(node.snapshot(), before);
    }

    #[test]
    fn test_reset_restores_admission() {
        let node = node(1, 100);
        assert!(node.allow_request(5));
        assert!(!node.allow_request(5));
        node.reset_counts();
        assert!(node.allow_request(5));
        assert_eq!(node.snapshot().total_requests, 2);
    }

    #[test]
    fn test_debug_hides_credential() {
        let node = Node::new("http://a", "hunter2", 1, 1).unwrap();
        let debug = format!("{:?}", node);
        assert!(debug.contains("http://a"));
        assert!(!debug.contains("hunter2"));
    }
}
