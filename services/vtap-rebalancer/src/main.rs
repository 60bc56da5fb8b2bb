// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! VTap Rebalancer Service
//!
//! Serves the rebalance API over HTTP. Each request:
//!
//! - Loads AZs, analyzers, probes and controllers from PostgreSQL
//! - Samples per-probe traffic from each region's querier (traffic mode)
//! - Plans a balanced probe → analyzer assignment per AZ
//! - Returns a before/after report and optionally applies the plan

use anyhow::{Context, Result};
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use tokio::sync::watch;
use tracing::info;

use vtap_rebalancer::VTapRebalancerImpl;
use vtap_rebalancer::config::RebalancerConfig;
use vtap_rebalancer::context::ApiContext;

/// Default bind address for the HTTP server.
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:20417";

/// Default maximum request body size (bytes).
const DEFAULT_BODY_MAX_BYTES: usize = 1024 * 1024; // 1MB

fn print_version() {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let buildstamp = option_env!("STAMP").unwrap_or("no-STAMP");
    println!("{} {} ({})", name, version, buildstamp);
}

fn print_help(program: &str) {
    print_version();
    println!("Usage: {} [OPTIONS]", program);
    println!();
    println!("Options:");
    println!("  -h, --help               Display this information");
    println!("  -V, --version            Display the program's version number");
    println!();
    println!("Environment variables:");
    println!(
        "  BIND_ADDRESS             Server bind address (default: {})",
        DEFAULT_BIND_ADDRESS
    );
    println!("  DATABASE_URL             PostgreSQL inventory URL (required)");
    println!("  QUERIER_URL              Traffic querier base URL (required)");
    println!("  HTTP_TIMEOUT_SECS        Querier request timeout (default: 30)");
    println!("  DATA_DURATION_SECS       Default traffic window (default: 3600)");
    println!("  DEFAULT_REBALANCE_TYPE   weight or traffic (default: traffic)");
    println!("  APPLY_PLAN               Apply plans by default (default: false)");
    println!("  CONFIG_FILE              JSON config file reloaded on SIGUSR1 (optional)");
    println!("  RUST_LOG                 Log filter (default: vtap_rebalancer=info,dropshot=info)");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    #[allow(clippy::never_loop)] // Intentional: early return on first recognized arg
    for arg in &args[1..] {
        match arg.as_str() {
            "-V" | "--version" => {
                print_version();
                return Ok(());
            }
            "-h" | "--help" => {
                print_help(&args[0]);
                return Ok(());
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "vtap_rebalancer=info,dropshot=info".to_string()),
        ))
        .init();

    print_version();
    vtap_rebalancer::install_crypto_provider();
    vtap_rebalancer::metrics::register_metrics();

    let config = RebalancerConfig::from_env().context("Failed to load configuration")?;
    info!("Database URL: {}", config.database_url_display());
    info!("Querier URL: {}", config.querier_url_display());
    info!(
        rebalance_type = %config.rebalance_type,
        data_duration_secs = config.data_duration_secs,
        apply_plan = config.apply_plan,
        "Run defaults"
    );

    let (config_tx, config_rx) = watch::channel(config.clone());

    #[cfg(unix)]
    if let Ok(config_file) = std::env::var("CONFIG_FILE") {
        use std::path::PathBuf;

        let config_path = PathBuf::from(&config_file);
        if tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
            tokio::spawn(RebalancerConfig::start_config_watcher(
                config_path,
                config.clone(),
                config_tx,
            ));
            info!(
                config_file = %config_file,
                "Config watcher started - send SIGUSR1 to reload"
            );
        } else {
            tracing::warn!(
                config_file = %config_file,
                "CONFIG_FILE specified but file does not exist, config reloading disabled"
            );
        }
    }

    #[cfg(not(unix))]
    drop(config_tx);

    let api_context = ApiContext::new(config_rx)
        .await
        .context("Failed to create API context")?;

    let api = vtap_rebalance_api::vtap_rebalance_api_mod::api_description::<VTapRebalancerImpl>()
        .map_err(|e| anyhow::anyhow!("Failed to create API description: {}", e))?;

    let bind_address = std::env::var("BIND_ADDRESS")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
        .parse()
        .context("Invalid BIND_ADDRESS")?;

    let config_dropshot = ConfigDropshot {
        bind_address,
        default_request_body_max_bytes: DEFAULT_BODY_MAX_BYTES,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let config_logging = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };

    let log = config_logging
        .to_logger("vtap-rebalancer")
        .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    let server = HttpServerStarter::new(&config_dropshot, api, api_context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    info!("VTap rebalancer running on http://{}", bind_address);

    server
        .await
        .map_err(|error| anyhow::anyhow!("server failed: {}", error))
}
