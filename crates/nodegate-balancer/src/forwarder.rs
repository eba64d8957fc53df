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

//! Hand-off to the upstream node.

use crate::node::Node;
use nodegate_common::ForwardRequest;
use tracing::debug;

/// Performs the actual upstream call for an admitted request.
///
/// The balancer decides whether and where a request goes; a forwarder
/// decides how. Implementations must not block: `forward` is called on the
/// request-handling task right after admission.
pub trait Forwarder: Send + Sync {
    fn forward(&self, node: &Node, request: &ForwardRequest);
}

/// Records the hand-off and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingForwarder;

impl Forwarder for LoggingForwarder {
    fn forward(&self, node: &Node, request: &ForwardRequest) {
        debug!(
            "Forwarding {} {} to {}",
            request.method,
            request.path,
            node.address()
        );
    }
}

impl<F: Fn(&Node, &ForwardRequest) + Send + Sync> Forwarder for F {
    fn forward(&self, node: &Node, request: &ForwardRequest) {
        self(node, request)
    }
}
