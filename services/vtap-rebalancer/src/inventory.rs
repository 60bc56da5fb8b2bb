// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Inventory snapshot and the gateway that loads and updates it

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use thiserror::Error;

use vtap_rebalance_types::{
    Analyzer, AvailabilityZone, AzAnalyzerConnection, AzControllerConnection, Controller,
    ProbeMove, VTap,
};

use crate::rebalance::multimap::OrderedMultiMap;

/// Inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Inventory connection error: {0}")]
    Connection(String),

    #[error("Inventory query error: {0}")]
    Query(String),
}

/// Everything the rebalancer reads from the inventory in one run.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    pub azs: Vec<AvailabilityZone>,
    pub analyzers: Vec<Analyzer>,
    pub az_analyzer_conns: Vec<AzAnalyzerConnection>,
    pub vtaps: Vec<VTap>,
    pub controllers: Vec<Controller>,
    pub az_controller_conns: Vec<AzControllerConnection>,
}

impl InventorySnapshot {
    /// Region identifier → AZ identifiers of that region
    pub fn region_to_azs(&self) -> OrderedMultiMap<String, String> {
        self.azs
            .iter()
            .map(|az| (az.region.clone(), az.lcuuid.clone()))
            .collect()
    }

    pub fn analyzers_by_ip(&self) -> HashMap<&str, &Analyzer> {
        self.analyzers.iter().map(|a| (a.ip.as_str(), a)).collect()
    }

    /// Probes that may be moved; pinned probes are left out.
    pub fn rebalanceable_vtaps(&self) -> impl Iterator<Item = &VTap> {
        self.vtaps.iter().filter(|v| !v.is_pinned())
    }

    /// Region identifier → domain prefix of the controller serving it.
    ///
    /// Every region with at least one AZ is present. Regions without a
    /// known controller map to the empty prefix (the local region).
    pub fn region_domain_prefixes(&self) -> BTreeMap<String, String> {
        let controllers: HashMap<&str, &Controller> = self
            .controllers
            .iter()
            .map(|c| (c.ip.as_str(), c))
            .collect();

        let mut prefixes: BTreeMap<String, String> = self
            .azs
            .iter()
            .map(|az| (az.region.clone(), String::new()))
            .collect();

        for conn in &self.az_controller_conns {
            let Some(controller) = controllers.get(conn.controller_ip.as_str()) else {
                tracing::debug!(
                    controller_ip = %conn.controller_ip,
                    region = %conn.region,
                    "AZ controller connection refers to unknown controller"
                );
                continue;
            };
            let prefix = prefixes.entry(conn.region.clone()).or_default();
            if prefix.is_empty() {
                prefix.clone_from(&controller.region_domain_prefix);
            }
        }

        prefixes
    }
}

/// Source of inventory snapshots and sink for applied plans.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Read all inventory tables the rebalancer needs.
    async fn load_snapshot(&self) -> Result<InventorySnapshot, InventoryError>;

    /// Point every probe in `moves` at its new analyzer, all or nothing.
    async fn apply_assignments(&self, moves: &[ProbeMove]) -> Result<(), InventoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn az(lcuuid: &str, region: &str) -> AvailabilityZone {
        AvailabilityZone {
            lcuuid: lcuuid.to_string(),
            name: lcuuid.to_string(),
            region: region.to_string(),
        }
    }

    fn controller(ip: &str, prefix: &str) -> Controller {
        Controller {
            lcuuid: format!("ctrl-{}", ip),
            ip: ip.to_string(),
            region_domain_prefix: prefix.to_string(),
        }
    }

    fn conn(region: &str, controller_ip: &str) -> AzControllerConnection {
        AzControllerConnection {
            az: "ALL".to_string(),
            region: region.to_string(),
            controller_ip: controller_ip.to_string(),
        }
    }

    #[test]
    fn region_to_azs_groups_by_region() {
        let snapshot = InventorySnapshot {
            azs: vec![az("az-2", "r1"), az("az-3", "r2"), az("az-1", "r1")],
            ..Default::default()
        };

        let map = snapshot.region_to_azs();
        assert_eq!(map.get(&"r1".to_string()), &["az-2", "az-1"]);
        assert_eq!(map.get(&"r2".to_string()), &["az-3"]);
    }

    #[test]
    fn domain_prefixes_default_to_local() {
        let snapshot = InventorySnapshot {
            azs: vec![az("az-1", "master"), az("az-2", "remote"), az("az-3", "lonely")],
            controllers: vec![controller("10.1.0.1", ""), controller("10.2.0.1", "r2-")],
            az_controller_conns: vec![
                conn("master", "10.1.0.1"),
                conn("remote", "10.9.9.9"),
                conn("remote", "10.2.0.1"),
            ],
            ..Default::default()
        };

        let prefixes = snapshot.region_domain_prefixes();
        assert_eq!(prefixes.len(), 3);
        assert_eq!(prefixes["master"], "");
        assert_eq!(prefixes["remote"], "r2-");
        assert_eq!(prefixes["lonely"], "");
    }

    #[test]
    fn pinned_vtaps_are_not_rebalanceable() {
        let vtap = |name: &str, vtap_type: i32| VTap {
            lcuuid: name.to_string(),
            name: name.to_string(),
            az: "az-1".to_string(),
            region: "r1".to_string(),
            analyzer_ip: "10.0.0.1".to_string(),
            vtap_type,
        };
        let snapshot = InventorySnapshot {
            vtaps: vec![
                vtap("a", 1),
                vtap("b", vtap_rebalance_types::VTAP_TYPE_TUNNEL_DECAPSULATION),
                vtap("c", 3),
            ],
            ..Default::default()
        };

        let names: Vec<&str> = snapshot
            .rebalanceable_vtaps()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
