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

use crate::dispatcher::Dispatcher;
use crate::forwarder::{Forwarder, LoggingForwarder};
use crate::node::Node;
use crate::shutdown::{self, Shutdown, ShutdownHandle};
use crate::sink::{TracingSink, UsageSink};
use crate::usage_monitor::UsageMonitor;
use crate::window_reset::WindowReset;
use nodegate_common::{BalancerConfig, ForwardRequest, NodeSnapshot, Result};
use std::sync::Arc;
use tracing::info;

/// Nodegate balancer - admission control and first-fit dispatch over a
/// fixed pool of backend nodes.
///
/// The balancer owns the node pool and wires the three moving parts
/// together:
///
/// 1. **Dispatch**: [`Dispatcher`] scans the pool for a node whose window
///    still has room for the request's cost
/// 2. **Window reset**: [`WindowReset`] zeroes per-node window counters on a
///    fixed cadence
/// 3. **Usage reporting**: [`UsageMonitor`] reports lifetime totals to the
///    configured [`UsageSink`]
///
/// Pool membership never changes after construction.
pub struct Balancer {
    nodes: Arc<[Arc<Node>]>,
    dispatcher: Dispatcher,
    shutdown: ShutdownHandle,
    /// Background task handles (kept so the tasks can be awaited on shutdown)
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Balancer {
    /// Creates a balancer with the logging forwarder and tracing sink.
    ///
    /// Must be called inside a Tokio runtime: the window reset and usage
    /// monitor tasks are spawned immediately.
    ///
    /// # Example
    /// ```no_run
    /// # use nodegate_balancer::Balancer;
    /// # use nodegate_common::{BalancerConfig, ForwardRequest};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let balancer = Balancer::new(BalancerConfig::sample())?;
    /// let node = balancer.dispatch(&ForwardRequest::get("/v1/chat"), 8).await?;
    /// println!("Request directed to {}", node.address());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: BalancerConfig) -> Result<Self> {
        Self::with_collaborators(config, Arc::new(LoggingForwarder), Arc::new(TracingSink))
    }

    /// Creates a balancer with a custom forwarder and usage sink.
    ///
    /// # Errors
    /// `GateError::InvalidConfig` if the configuration does not validate.
    pub fn with_collaborators(
        config: BalancerConfig,
        forwarder: Arc<dyn Forwarder>,
        sink: Arc<dyn UsageSink>,
    ) -> Result<Self> {
        config.validate()?;

        let nodes = config
            .nodes
            .iter()
            .map(|node| Node::from_config(node).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        let nodes: Arc<[Arc<Node>]> = nodes.into();

        let (shutdown, listener) = shutdown::channel();

        let dispatcher = Dispatcher::new(nodes.clone(), config.retry.clone())
            .with_forwarder(forwarder)
            .with_shutdown(listener.clone());

        let window_reset = WindowReset::new(
            nodes.clone(),
            config.schedule.window(),
            sink.clone(),
            listener.clone(),
        );
        let usage_monitor = UsageMonitor::new(
            nodes.clone(),
            config.schedule.report_interval(),
            sink,
            listener,
        );
        let tasks = vec![window_reset.spawn(), usage_monitor.spawn()];

        info!(
            "Balancer initialized with {} nodes (window {}ms, report every {}ms, {} retries)",
            nodes.len(),
            config.schedule.window_ms,
            config.schedule.report_interval_ms,
            config.retry.max_retries
        );

        Ok(Self {
            nodes,
            dispatcher,
            shutdown,
            tasks,
        })
    }

    /// Selects a node for `request` and forwards it.
    ///
    /// # Returns
    /// - `Ok(node)` - the node that admitted the request
    /// - `Err(GateError::CapacityExhausted)` - no node admitted it within
    ///   the retry bound
    pub async fn dispatch(&self, request: &ForwardRequest, cost: u64) -> Result<Arc<Node>> {
        self.dispatcher.dispatch(request, cost).await
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current counters of every node, in pool order.
    pub fn usage(&self) -> Vec<NodeSnapshot> {
        self.nodes.iter().map(|node| node.snapshot()).collect()
    }

    /// A listener tied to this balancer's shutdown trigger.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.shutdown.subscribe()
    }

    /// Stops the background tasks and aborts in-progress retry backoffs.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Triggers shutdown and waits for the background tasks to finish.
    pub async fn join(mut self) {
        self.shutdown.trigger();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

impl Drop for Balancer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodegate_common::{GateError, NodeConfig, RetryConfig, ScheduleConfig};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        usage: Mutex<Vec<NodeSnapshot>>,
        resets: Mutex<Vec<usize>>,
    }

    impl UsageSink for RecordingSink {
        fn node_usage(&self, usage: &NodeSnapshot) {
            self.usage.lock().unwrap().push(usage.clone());
        }

        fn window_reset(&self, node_count: usize) {
            self.resets.lock().unwrap().push(node_count);
        }
    }

    #[tokio::test]
    async fn test_balancer_creation() {
        let balancer = Balancer::new(BalancerConfig::sample()).unwrap();
        assert_eq!(balancer.node_count(), 2);
        assert_eq!(balancer.nodes()[0].address(), "http://node1.example.com");
        assert_eq!(balancer.nodes()[1].address(), "http://node2.example.com");
    }

    #[tokio::test]
    async fn test_balancer_rejects_invalid_config() {
        let result = Balancer::new(BalancerConfig::new(vec![]));
        assert!(matches!(result, Err(GateError::InvalidConfig(_))));

        let result = Balancer::new(BalancerConfig::new(vec![NodeConfig::new("http://a", "k", 0, 1)]));
        assert!(matches!(result, Err(GateError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_balancer_usage_reflects_dispatch() {
        let balancer = Balancer::new(BalancerConfig::sample()).unwrap();
        balancer.dispatch(&ForwardRequest::get("/abc"), 4).await.unwrap();

        let usage = balancer.usage();
        assert_eq!(usage[0].window_requests, 1);
        assert_eq!(usage[0].window_bytes, 4);
        assert_eq!(usage[1].window_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_tasks_follow_schedule() {
        let sink = Arc::new(RecordingSink::default());
        let config = BalancerConfig::new(vec![NodeConfig::new("http://a", "k", 1, 10)])
            .with_retry(RetryConfig {
                max_retries: 0,
                backoff_ms: 1,
            })
            .with_schedule(ScheduleConfig {
                window_ms: 1000,
                report_interval_ms: 400,
            });
        let balancer =
            Balancer::with_collaborators(config, Arc::new(LoggingForwarder), sink.clone()).unwrap();

        balancer.dispatch(&ForwardRequest::get("/"), 1).await.unwrap();
        assert!(balancer.dispatch(&ForwardRequest::get("/"), 1).await.is_err());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(*sink.resets.lock().unwrap(), vec![1]);
        // reports at 400ms and 800ms
        assert_eq!(sink.usage.lock().unwrap().len(), 2);
        assert!(balancer.dispatch(&ForwardRequest::get("/"), 1).await.is_ok());

        balancer.join().await;
    }
}
