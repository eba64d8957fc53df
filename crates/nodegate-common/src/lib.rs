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

//! Nodegate Common Types
//!
//! Shared definitions used by the balancer core and the command-line binary:
//!
//! - [`error`] - the `GateError` enum and crate-wide `Result` alias
//! - [`config`] - node pool, retry and schedule configuration loaded at startup
//! - [`snapshot`] - serializable per-node usage snapshots
//! - [`request`] - the transport-neutral description of an inbound request
//!
//! # Example
//!
//! ```
//! use nodegate_common::BalancerConfig;
//!
//! let config = BalancerConfig::sample();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.nodes.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod request;
pub mod snapshot;

pub use config::{BalancerConfig, NodeConfig, RetryConfig, ScheduleConfig};
pub use error::{GateError, Result};
pub use request::ForwardRequest;
pub use snapshot::NodeSnapshot;
