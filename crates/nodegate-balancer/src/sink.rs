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

//! Observability sink for the periodic tasks.

use nodegate_common::NodeSnapshot;
use tracing::info;

/// Receives usage records and window-reset events.
///
/// Called from the background tasks, never from the request path.
pub trait UsageSink: Send + Sync {
    /// One record per node per monitor firing.
    fn node_usage(&self, usage: &NodeSnapshot);

    /// One event per window-reset firing, after every node was reset.
    fn window_reset(&self, node_count: usize);
}

/// Emits records as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl UsageSink for TracingSink {
    fn node_usage(&self, usage: &NodeSnapshot) {
        info!(
            node = %usage.address,
            total_requests = usage.total_requests,
            total_bytes = usage.total_bytes,
            "Node {}: {} requests, {} bytes processed",
            usage.address,
            usage.total_requests,
            usage.total_bytes
        );
    }

    fn window_reset(&self, node_count: usize) {
        info!(nodes = node_count, "Rate limits reset.");
    }
}
