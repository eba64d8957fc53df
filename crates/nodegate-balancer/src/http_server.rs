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

//! HTTP entry point.
//!
//! Every request outside the reserved `/__` paths is a dispatch request:
//! its cost is estimated, a node is selected, and the response names the
//! chosen node. The upstream call itself belongs to the configured
//! [`Forwarder`](crate::Forwarder).

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::balancer::Balancer;
use crate::cost::{CostEstimator, PathLengthEstimator};
use nodegate_common::{ForwardRequest, GateError};

/// Shared handler state.
struct AppState {
    balancer: Arc<Balancer>,
    estimator: Arc<dyn CostEstimator>,
}

/// HTTP server for the balancer.
///
/// This server:
/// - Dispatches any request at any path through the balancer
/// - Provides a health check endpoint at `/__health`
/// - Exposes current per-node counters at `/__usage`
pub struct HttpServer {
    state: Arc<AppState>,
}

impl HttpServer {
    /// Creates a server that charges each request the length of its path.
    pub fn new(balancer: Arc<Balancer>) -> Self {
        Self::with_estimator(balancer, Arc::new(PathLengthEstimator))
    }

    pub fn with_estimator(balancer: Arc<Balancer>, estimator: Arc<dyn CostEstimator>) -> Self {
        Self {
            state: Arc::new(AppState {
                balancer,
                estimator,
            }),
        }
    }

    /// Builds the axum router.
    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .route("/__health", axum::routing::get(health_check))
            .route("/__usage", axum::routing::get(usage))
            .fallback(handle_dispatch)
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Binds `addr` and serves until the balancer shuts down.
    pub async fn run(self, addr: SocketAddr) -> Result<(), GateError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GateError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until the balancer shuts down.
    pub async fn serve(self, listener: TcpListener) -> Result<(), GateError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| GateError::Transport(format!("Failed to get local addr: {}", e)))?;
        info!("Load Balancer is running on {}", local_addr);

        let mut shutdown = self.state.balancer.shutdown_signal();
        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.triggered().await })
            .await
            .map_err(|e| GateError::Transport(format!("Server error: {}", e)))?;

        info!("HTTP server on {} stopped", local_addr);
        Ok(())
    }
}

/// Dispatches a request and reports the chosen node.
async fn handle_dispatch(State(state): State<Arc<AppState>>, method: Method, uri: Uri) -> Response {
    let request = ForwardRequest::new(method.as_str(), uri.path());
    let cost = state.estimator.estimate(&request);

    match state.balancer.dispatch(&request, cost).await {
        Ok(node) => (
            StatusCode::OK,
            format!("Request directed to {}\n", node.address()),
        )
            .into_response(),
        Err(GateError::CapacityExhausted) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{}\n", GateError::CapacityExhausted),
        )
            .into_response(),
        Err(e) => {
            error!("Dispatch failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e)).into_response()
        }
    }
}

/// Handles health check GET requests.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Current counters of every node, in pool order.
async fn usage(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.balancer.usage())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodegate_common::{BalancerConfig, NodeConfig, RetryConfig};

    fn single_node_balancer() -> Arc<Balancer> {
        let config = BalancerConfig::new(vec![NodeConfig::new("http://node1.example.com", "k", 1, 100)])
            .with_retry(RetryConfig {
                max_retries: 0,
                backoff_ms: 1,
            });
        Arc::new(Balancer::new(config).unwrap())
    }

    fn state(balancer: Arc<Balancer>) -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            balancer,
            estimator: Arc::new(PathLengthEstimator),
        }))
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dispatch_success_then_exhausted() {
        let balancer = single_node_balancer();

        let response = handle_dispatch(
            state(balancer.clone()),
            Method::GET,
            Uri::from_static("/hello"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(balancer.usage()[0].window_bytes, 6);

        let response = handle_dispatch(
            state(balancer.clone()),
            Method::GET,
            Uri::from_static("/hello"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_query_string_is_not_charged() {
        let balancer = single_node_balancer();
        handle_dispatch(
            state(balancer.clone()),
            Method::POST,
            Uri::from_static("/ab?padding=xxxxxxxxxxxx"),
        )
        .await;
        assert_eq!(balancer.usage()[0].window_bytes, 3);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = HttpServer::new(single_node_balancer());
        let _router = server.router();
        assert!(Arc::strong_count(&server.state) >= 1);
    }
}
