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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    /// Every node rejected admission on every attempt.
    #[error("All nodes are at capacity.")]
    CapacityExhausted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_exhausted_message() {
        assert_eq!(
            GateError::CapacityExhausted.to_string(),
            "All nodes are at capacity."
        );
    }

    #[test]
    fn test_invalid_config_message() {
        let err = GateError::InvalidConfig("empty node list".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: empty node list");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GateError = json_err.into();
        assert!(matches!(err, GateError::JsonSerialization(_)));
    }
}
