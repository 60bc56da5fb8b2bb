// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! VTap rebalancing
//!
//! A run loads an inventory snapshot, optionally samples per-probe traffic
//! for every region that has probes, plans each AZ independently and
//! reports the before/after state of every analyzer involved. When asked
//! to, it writes the plan back through the inventory gateway.

pub mod multimap;
pub mod planner;
pub mod report;
pub mod resolver;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use futures_util::future::try_join_all;
use thiserror::Error;

use vtap_rebalance_types::{
    Analyzer, ProbeMove, RebalanceType, VTapName, VTapRebalanceResult,
};

use crate::inventory::{InventoryError, InventoryGateway, InventorySnapshot};
use crate::metrics;
use crate::querier::{InvalidWindow, QuerierError, TrafficSampler, TrafficWindow};

use self::planner::{ProbeLoad, plan_az};

/// Per-region traffic samples: region → probe name → traffic
pub type RegionTraffic = HashMap<String, HashMap<VTapName, u64>>;

/// Rebalance errors
#[derive(Debug, Error)]
pub enum RebalanceError {
    #[error("Failed to load inventory: {0}")]
    Inventory(#[source] InventoryError),

    #[error("Failed to sample traffic for region {region}: {source}")]
    Traffic {
        region: String,
        #[source]
        source: QuerierError,
    },

    #[error("Failed to apply plan: {0}")]
    Apply(#[source] InventoryError),

    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindow),
}

/// Parameters of one run
#[derive(Debug, Clone)]
pub struct RebalanceParams {
    pub rebalance_type: RebalanceType,
    pub window: TrafficWindow,
    /// Write the plan back to the inventory
    pub apply: bool,
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct RebalanceOutcome {
    pub result: VTapRebalanceResult,
    pub moves: Vec<ProbeMove>,
    /// Whether `moves` were written back
    pub applied: bool,
}

/// Drives a run against an inventory and a traffic source.
pub struct Rebalancer<'a> {
    inventory: &'a dyn InventoryGateway,
    sampler: &'a dyn TrafficSampler,
}

impl<'a> Rebalancer<'a> {
    pub fn new(inventory: &'a dyn InventoryGateway, sampler: &'a dyn TrafficSampler) -> Self {
        Self { inventory, sampler }
    }

    /// Execute one rebalance run.
    ///
    /// Any inventory or traffic failure aborts the run before anything is
    /// written.
    pub async fn run(&self, params: &RebalanceParams) -> Result<RebalanceOutcome, RebalanceError> {
        let started = Instant::now();
        let outcome = self.run_inner(params).await;
        metrics::record_run(params.rebalance_type, outcome.is_ok(), started.elapsed());
        if let Ok(o) = &outcome {
            metrics::record_switched_vtaps(o.result.total_switch_vtap_num);
        }
        outcome
    }

    async fn run_inner(&self, params: &RebalanceParams) -> Result<RebalanceOutcome, RebalanceError> {
        let snapshot = self
            .inventory
            .load_snapshot()
            .await
            .map_err(RebalanceError::Inventory)?;

        let traffic = match params.rebalance_type {
            RebalanceType::Weight => None,
            RebalanceType::Traffic => Some(self.sample_traffic(&snapshot, &params.window).await?),
        };

        let (result, moves) = compute_plan(&snapshot, traffic.as_ref());

        let applied = params.apply && !moves.is_empty();
        if applied {
            self.inventory
                .apply_assignments(&moves)
                .await
                .map_err(RebalanceError::Apply)?;
        }

        tracing::info!(
            rebalance_type = %params.rebalance_type,
            switched = result.total_switch_vtap_num,
            hosts = result.details.len(),
            applied,
            "Rebalance run complete"
        );

        Ok(RebalanceOutcome {
            result,
            moves,
            applied,
        })
    }

    /// Query every region that has rebalanceable probes, concurrently.
    async fn sample_traffic(
        &self,
        snapshot: &InventorySnapshot,
        window: &TrafficWindow,
    ) -> Result<RegionTraffic, RebalanceError> {
        let regions: BTreeSet<&str> = snapshot
            .rebalanceable_vtaps()
            .map(|v| v.region.as_str())
            .collect();
        let prefixes = snapshot.region_domain_prefixes();

        let queries = regions.into_iter().map(|region| {
            let prefix = prefixes.get(region).map(String::as_str).unwrap_or_default();
            async move {
                self.sampler
                    .traffic_by_window(prefix, window)
                    .await
                    .map(|traffic| (region.to_string(), traffic))
                    .map_err(|source| RebalanceError::Traffic {
                        region: region.to_string(),
                        source,
                    })
            }
        });

        let sampled = try_join_all(queries).await?;
        Ok(sampled.into_iter().collect())
    }
}

/// Plan every AZ of `snapshot`.
///
/// Weight-only mode (`traffic` is `None`) gives every probe weight 1.
/// Otherwise a probe weighs its sampled traffic, or 0 when it has none.
/// Returns the report and the probe moves, AZs in identifier order.
pub fn compute_plan(
    snapshot: &InventorySnapshot,
    traffic: Option<&RegionTraffic>,
) -> (VTapRebalanceResult, Vec<ProbeMove>) {
    let analyzers_by_ip = snapshot.analyzers_by_ip();
    let eligible = resolver::resolve_az_analyzers(
        &snapshot.az_analyzer_conns,
        &snapshot.region_to_azs(),
        &analyzers_by_ip,
    );

    let mut probes_by_az: BTreeMap<&str, Vec<ProbeLoad>> = BTreeMap::new();
    for vtap in snapshot.rebalanceable_vtaps() {
        let load = match traffic {
            None => ProbeLoad::new(vtap, 1, 0),
            Some(by_region) => {
                let sampled = by_region
                    .get(&vtap.region)
                    .and_then(|t| t.get(&vtap.name))
                    .copied()
                    .unwrap_or(0);
                ProbeLoad::new(vtap, sampled, sampled)
            }
        };
        probes_by_az.entry(vtap.az.as_str()).or_default().push(load);
    }

    let mut az_results = Vec::with_capacity(probes_by_az.len());
    let mut moves = Vec::new();

    for (az, probes) in &probes_by_az {
        let candidates: Vec<&Analyzer> = eligible
            .get(&az.to_string())
            .iter()
            .filter(|a| a.is_enabled())
            .collect();

        if candidates.is_empty() {
            tracing::warn!(
                az = %az,
                vtaps = probes.len(),
                "No enabled analyzer eligible for AZ, leaving its probes in place"
            );
        }

        let targets = plan_az(&candidates, probes);

        for (probe, target) in probes.iter().zip(&targets) {
            if let Some(to_ip) = target {
                if probe.current.as_ref() != Some(to_ip) {
                    moves.push(ProbeMove {
                        vtap_lcuuid: probe.lcuuid.clone(),
                        vtap_name: probe.name.clone(),
                        az: az.to_string(),
                        from_ip: probe.current.clone(),
                        to_ip: to_ip.clone(),
                    });
                }
            }
        }

        let az_result =
            report::az_result(az, probes, &targets, candidates.len(), &analyzers_by_ip);

        tracing::debug!(
            az = %az,
            candidates = candidates.len(),
            vtaps = probes.len(),
            switched = az_result.total_switch_vtap_num,
            "Planned AZ"
        );

        az_results.push(az_result);
    }

    (VTapRebalanceResult::from_az_results(az_results), moves)
}
