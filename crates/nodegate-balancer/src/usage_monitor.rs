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

//! Periodic usage reporting.

use crate::node::Node;
use crate::shutdown::Shutdown;
use crate::sink::UsageSink;
use nodegate_common::NodeSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Reads every node's counters on a fixed cadence and reports them.
///
/// Read-only: the monitor takes one snapshot per node under that node's
/// lock and never mutates anything.
pub struct UsageMonitor {
    nodes: Arc<[Arc<Node>]>,
    interval: Duration,
    sink: Arc<dyn UsageSink>,
    shutdown: Shutdown,
}

impl UsageMonitor {
    pub fn new(
        nodes: Arc<[Arc<Node>]>,
        interval: Duration,
        sink: Arc<dyn UsageSink>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            nodes,
            interval,
            sink,
            shutdown,
        }
    }

    /// Starts the monitor task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut interval = interval_at(Instant::now() + self.interval, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.report_all();
                }
                _ = shutdown.triggered() => {
                    debug!("Usage monitor stopped");
                    return;
                }
            }
        }
    }

    /// Emits one record per node, in list order, and returns them.
    pub fn report_all(&self) -> Vec<NodeSnapshot> {
        self.nodes
            .iter()
            .map(|node| {
                let usage = node.snapshot();
                self.sink.node_usage(&usage);
                usage
            })
            .collect()
    }
}
