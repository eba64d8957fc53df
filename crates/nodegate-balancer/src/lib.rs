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

//! # Nodegate Balancer
//!
//! Admission control and dispatch across a fixed pool of backend nodes.
//!
//! Each [`Node`] enforces two independent limits per window: a maximum
//! number of admitted requests and a maximum admitted byte volume. The
//! [`Dispatcher`] picks the first node, in pool order, whose gate admits a
//! request's cost, retrying with a fixed backoff when the whole pool is
//! full. [`WindowReset`] clears the window counters on a fixed cadence and
//! [`UsageMonitor`] reports lifetime totals on another.
//!
//! ## Collaborators
//!
//! - [`Forwarder`]: performs the upstream call for an admitted request
//! - [`CostEstimator`]: derives a request's cost (path length by default)
//! - [`UsageSink`]: receives usage records and reset events (`tracing` by default)
//!
//! ## Example
//!
//! ```no_run
//! use nodegate_balancer::{Balancer, HttpServer};
//! use nodegate_common::BalancerConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let balancer = Arc::new(Balancer::new(BalancerConfig::sample())?);
//!     HttpServer::new(balancer).run("0.0.0.0:5555".parse()?).await?;
//!     Ok(())
//! }
//! ```

pub mod balancer;
pub mod cost;
pub mod dispatcher;
pub mod forwarder;
pub mod http_server;
pub mod node;
pub mod shutdown;
pub mod sink;
pub mod usage_monitor;
pub mod window_reset;

pub use balancer::Balancer;
pub use cost::{CostEstimator, FixedCost, PathLengthEstimator};
pub use dispatcher::Dispatcher;
pub use forwarder::{Forwarder, LoggingForwarder};
pub use http_server::HttpServer;
pub use node::Node;
pub use shutdown::{Shutdown, ShutdownHandle};
pub use sink::{TracingSink, UsageSink};
pub use usage_monitor::UsageMonitor;
pub use window_reset::WindowReset;
