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

use serde::{Deserialize, Serialize};

/// Point-in-time view of one node's counters, taken under that node's lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub address: String,
    pub max_requests_per_window: u64,
    pub max_bytes_per_window: u64,
    /// Requests admitted in the current window
    pub window_requests: u64,
    /// Bytes admitted in the current window
    pub window_bytes: u64,
    /// Requests admitted since startup
    pub total_requests: u64,
    /// Bytes admitted since startup
    pub total_bytes: u64,
}
