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

use nodegate_common::ForwardRequest;

/// Derives the byte-equivalent cost a request charges against a node.
pub trait CostEstimator: Send + Sync {
    fn estimate(&self, request: &ForwardRequest) -> u64;
}

/// Charges the byte length of the request path.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLengthEstimator;

impl CostEstimator for PathLengthEstimator {
    fn estimate(&self, request: &ForwardRequest) -> u64 {
        request.path.len() as u64
    }
}

/// Charges the same cost for every request.
#[derive(Debug, Clone, Copy)]
pub struct FixedCost(pub u64);

impl CostEstimator for FixedCost {
    fn estimate(&self, _request: &ForwardRequest) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_length() {
        let estimator = PathLengthEstimator;
        assert_eq!(estimator.estimate(&ForwardRequest::get("/")), 1);
        assert_eq!(estimator.estimate(&ForwardRequest::get("/v1/chat")), 8);
        assert_eq!(estimator.estimate(&ForwardRequest::get("")), 0);
    }

    #[test]
    fn test_path_length_counts_bytes() {
        // two bytes per character in UTF-8
        assert_eq!(PathLengthEstimator.estimate(&ForwardRequest::get("/éé")), 5);
    }

    #[test]
    fn test_fixed_cost() {
        let estimator = FixedCost(7);
        assert_eq!(estimator.estimate(&ForwardRequest::get("/anything/long")), 7);
    }
}
