// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Prometheus metrics for the VTap rebalancer
//!
//! - Rebalance runs by mode and outcome
//! - Probes switched to a different analyzer
//! - Run duration

use std::sync::Once;
use std::time::Duration;

use prometheus::{
    Counter, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use vtap_rebalance_types::RebalanceType;

// Static metric definitions cannot fail short of a programming error
// (e.g. an invalid metric name), so expect is scoped to this module.
#[allow(clippy::expect_used)]
mod metrics_impl {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        /// Registry for all rebalancer metrics
        pub static ref REGISTRY: Registry = Registry::new();

        /// Rebalance runs, labelled by mode and outcome
        pub static ref REBALANCE_RUNS: IntCounterVec = IntCounterVec::new(
            Opts::new(
                "vtap_rebalancer_runs_total",
                "Total rebalance runs by mode and outcome"
            ),
            &["type", "outcome"]
        ).expect("valid metric name");

        /// Probes whose analyzer changed across all successful runs
        pub static ref SWITCHED_VTAPS: Counter = Counter::with_opts(
            Opts::new(
                "vtap_rebalancer_switched_vtaps_total",
                "Total probes assigned to a different analyzer"
            )
        ).expect("valid metric name");

        /// Run duration in seconds, labelled by mode
        pub static ref RUN_DURATION: HistogramVec = HistogramVec::new(
            HistogramOpts::new(
                "vtap_rebalancer_run_duration_seconds",
                "Rebalance run duration in seconds"
            ),
            &["type"]
        ).expect("valid metric name");
    }
}

pub use metrics_impl::{REBALANCE_RUNS, REGISTRY, RUN_DURATION, SWITCHED_VTAPS};

static REGISTER: Once = Once::new();

/// Register all metrics with the registry
///
/// Only the first call registers; later calls are no-ops.
/// Panics if registration fails (indicates a programming error).
#[allow(clippy::expect_used)]
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(REBALANCE_RUNS.clone()))
            .expect("Failed to register REBALANCE_RUNS");
        REGISTRY
            .register(Box::new(SWITCHED_VTAPS.clone()))
            .expect("Failed to register SWITCHED_VTAPS");
        REGISTRY
            .register(Box::new(RUN_DURATION.clone()))
            .expect("Failed to register RUN_DURATION");
    });
}

/// Get metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

/// Record a finished rebalance run
pub fn record_run(rebalance_type: RebalanceType, success: bool, elapsed: Duration) {
    let mode = rebalance_type.to_string();
    let outcome = if success { "success" } else { "failure" };
    REBALANCE_RUNS
        .with_label_values(&[mode.as_str(), outcome])
        .inc();
    RUN_DURATION
        .with_label_values(&[mode.as_str()])
        .observe(elapsed.as_secs_f64());
}

/// Record probes switched by a successful run
pub fn record_switched_vtaps(count: u64) {
    SWITCHED_VTAPS.inc_by(count as f64);
}
