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

//! Periodic window reset.

use crate::node::Node;
use crate::shutdown::Shutdown;
use crate::sink::UsageSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Clears every node's current-window counters once per window.
///
/// Nodes are reset one at a time in list order, each under its own lock.
/// There is no pool-wide snapshot: windows are per node.
pub struct WindowReset {
    nodes: Arc<[Arc<Node>]>,
    window: Duration,
    sink: Arc<dyn UsageSink>,
    shutdown: Shutdown,
}

impl WindowReset {
    pub fn new(
        nodes: Arc<[Arc<Node>]>,
        window: Duration,
        sink: Arc<dyn UsageSink>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            nodes,
            window,
            sink,
            shutdown,
        }
    }

    /// Starts the reset task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Main reset loop. The first firing happens one full window after start.
    async fn run(self) {
        let mut interval = interval_at(Instant::now() + self.window, self.window);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = interval.tick() => self.reset_all(),
                _ = shutdown.triggered() => {
                    debug!("Window reset task stopped");
                    return;
                }
            }
        }
    }

    /// Resets every node and reports one completion event.
    pub fn reset_all(&self) {
        for node in self.nodes.iter() {
            node.reset_counts();
        }
        self.sink.window_reset(self.nodes.len());
    }
}
