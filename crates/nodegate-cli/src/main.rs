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

//! # Nodegate CLI Entry Point
//!
//! Main binary for the nodegate load balancer.
//!
//! ## Usage
//!
//! ```bash
//! # Serve with the built-in two-node sample pool
//! nodegate serve
//!
//! # Serve a configured pool on a custom address
//! nodegate serve -b 0.0.0.0:8080 -c pool.json --max-retries 5 --backoff-ms 250
//!
//! # Check a pool file without starting anything
//! nodegate validate -c demos/pool.json
//! ```

use anyhow::Result;
use argh::FromArgs;
use nodegate_balancer::{Balancer, HttpServer};
use nodegate_common::BalancerConfig;
use std::net::SocketAddr;
use std::sync::Arc;

/// Validates that a URL string starts with http:// or https://
fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

#[derive(FromArgs)]
/// nodegate - capacity-aware load balancer
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Validate(ValidateArgs),
}

/// Arguments for running the balancer.
///
/// Retry and schedule flags override the values from the configuration file.
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start the load balancer
struct ServeArgs {
    /// address to bind the HTTP server to
    ///
    /// Defaults to "0.0.0.0:5555".
    #[argh(option, short = 'b', default = "\"0.0.0.0:5555\".into()")]
    bind: String,

    /// path to a JSON pool configuration
    ///
    /// When omitted, the built-in two-node sample pool is used.
    #[argh(option, short = 'c', long = "config")]
    config: Option<String>,

    /// retries after the first scan before a request fails
    #[argh(option, long = "max-retries")]
    max_retries: Option<usize>,

    /// fixed wait between scans in milliseconds
    #[argh(option, long = "backoff-ms")]
    backoff_ms: Option<u64>,

    /// capacity window length in milliseconds
    #[argh(option, long = "window-ms")]
    window_ms: Option<u64>,

    /// usage report interval in milliseconds
    #[argh(option, long = "report-interval-ms")]
    report_interval_ms: Option<u64>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "validate")]
/// check a pool configuration file
struct ValidateArgs {
    /// path to a JSON pool configuration
    #[argh(option, short = 'c', long = "config")]
    config: String,
}

/// Loads the pool and applies flag overrides, then validates the result.
fn load_config(args: &ServeArgs) -> Result<BalancerConfig> {
    let mut config = match &args.config {
        Some(path) => BalancerConfig::from_json_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path, e))?,
        None => {
            tracing::warn!("No --config given, using the built-in sample pool");
            BalancerConfig::sample()
        }
    };

    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
    if let Some(backoff_ms) = args.backoff_ms {
        config.retry.backoff_ms = backoff_ms;
    }
    if let Some(window_ms) = args.window_ms {
        config.schedule.window_ms = window_ms;
    }
    if let Some(report_interval_ms) = args.report_interval_ms {
        config.schedule.report_interval_ms = report_interval_ms;
    }

    check_config(&config)?;
    Ok(config)
}

fn check_config(config: &BalancerConfig) -> Result<()> {
    config.validate()?;
    for node in &config.nodes {
        validate_http_url(&node.address, "node address")?;
    }
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = load_config(&args)?;
    let addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", args.bind, e))?;

    for node in &config.nodes {
        tracing::info!(
            "Node {}: {} requests / {} bytes per window",
            node.address,
            node.max_requests_per_window,
            node.max_bytes_per_window
        );
    }

    let balancer = Arc::new(Balancer::new(config)?);

    tokio::spawn({
        let balancer = balancer.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl-C, shutting down");
                balancer.shutdown();
            }
        }
    });

    HttpServer::new(balancer).run(addr).await?;
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let config = BalancerConfig::from_json_file(&args.config)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", args.config, e))?;
    check_config(&config)?;

    for node in &config.nodes {
        println!(
            "{}: {} requests / {} bytes per window",
            node.address, node.max_requests_per_window, node.max_bytes_per_window
        );
    }
    println!(
        "retries: {} (backoff {}ms), window: {}ms, report interval: {}ms",
        config.retry.max_retries,
        config.retry.backoff_ms,
        config.schedule.window_ms,
        config.schedule.report_interval_ms
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Set default log level to INFO, but allow RUST_LOG env var to override
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Validate(args) => run_validate(args),
    }
}
