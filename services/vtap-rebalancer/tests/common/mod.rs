// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! In-memory inventory and traffic fixtures shared by the integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use vtap_rebalance_types::{
    Analyzer, AnalyzerState, AvailabilityZone, AzAnalyzerConnection, AzControllerConnection,
    Controller, ProbeMove, VTap,
};
use vtap_rebalancer::inventory::{InventoryError, InventoryGateway, InventorySnapshot};
use vtap_rebalancer::querier::{QuerierError, TrafficSampler, TrafficWindow};

// ============================================================================
// Inventory fixture
// ============================================================================

/// Inventory held in memory; applied plans update the stored probes.
#[derive(Default)]
pub struct FixtureInventory {
    snapshot: Mutex<InventorySnapshot>,
    applied: Mutex<Vec<Vec<ProbeMove>>>,
    fail_load: bool,
    fail_apply: bool,
}

impl FixtureInventory {
    pub fn new(snapshot: InventorySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Default::default()
        }
    }

    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Default::default()
        }
    }

    pub fn failing_apply(snapshot: InventorySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail_apply: true,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    /// Every batch passed to `apply_assignments`, in call order
    pub fn applied(&self) -> Vec<Vec<ProbeMove>> {
        self.applied.lock().unwrap().clone()
    }

    pub fn analyzer_of(&self, vtap_name: &str) -> String {
        self.snapshot
            .lock()
            .unwrap()
            .vtaps
            .iter()
            .find(|v| v.name == vtap_name)
            .map(|v| v.analyzer_ip.clone())
            .unwrap()
    }
}

#[async_trait]
impl InventoryGateway for FixtureInventory {
    async fn load_snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        if self.fail_load {
            return Err(InventoryError::Connection("connection refused".to_string()));
        }
        Ok(self.snapshot())
    }

    async fn apply_assignments(&self, moves: &[ProbeMove]) -> Result<(), InventoryError> {
        if self.fail_apply {
            return Err(InventoryError::Query("deadlock detected".to_string()));
        }
        let mut snapshot = self.snapshot.lock().unwrap();
        for m in moves {
            if let Some(v) = snapshot.vtaps.iter_mut().find(|v| v.lcuuid == m.vtap_lcuuid) {
                v.analyzer_ip = m.to_ip.clone();
            }
        }
        self.applied.lock().unwrap().push(moves.to_vec());
        Ok(())
    }
}

// ============================================================================
// Traffic fixture
// ============================================================================

/// Fixed traffic per domain prefix; records every query it answers.
#[derive(Default)]
pub struct FixtureSampler {
    by_prefix: HashMap<String, HashMap<String, u64>>,
    failing_prefixes: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FixtureSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_traffic(mut self, prefix: &str, traffic: &[(&str, u64)]) -> Self {
        self.by_prefix.insert(
            prefix.to_string(),
            traffic.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
        );
        self
    }

    pub fn failing_for(mut self, prefix: &str) -> Self {
        self.failing_prefixes.push(prefix.to_string());
        self
    }

    /// Domain prefixes queried so far, sorted
    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl TrafficSampler for FixtureSampler {
    async fn traffic_by_window(
        &self,
        domain_prefix: &str,
        _window: &TrafficWindow,
    ) -> Result<HashMap<String, u64>, QuerierError> {
        self.calls.lock().unwrap().push(domain_prefix.to_string());
        if self.failing_prefixes.iter().any(|p| p == domain_prefix) {
            return Err(QuerierError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self
            .by_prefix
            .get(domain_prefix)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// Record builders
// ============================================================================

pub fn az(lcuuid: &str, region: &str) -> AvailabilityZone {
    AvailabilityZone {
        lcuuid: lcuuid.to_string(),
        name: format!("{}-name", lcuuid),
        region: region.to_string(),
    }
}

pub fn analyzer(lcuuid: &str, ip: &str) -> Analyzer {
    Analyzer {
        lcuuid: lcuuid.to_string(),
        name: lcuuid.to_string(),
        ip: ip.to_string(),
        state: AnalyzerState::Enabled,
    }
}

pub fn disabled_analyzer(lcuuid: &str, ip: &str) -> Analyzer {
    Analyzer {
        state: AnalyzerState::Disabled,
        ..analyzer(lcuuid, ip)
    }
}

pub fn az_conn(az: &str, region: &str, analyzer_ip: &str) -> AzAnalyzerConnection {
    AzAnalyzerConnection {
        az: az.to_string(),
        region: region.to_string(),
        analyzer_ip: analyzer_ip.to_string(),
    }
}

pub fn vtap(name: &str, az: &str, region: &str, analyzer_ip: &str) -> VTap {
    VTap {
        lcuuid: format!("vtap-{}", name),
        name: name.to_string(),
        az: az.to_string(),
        region: region.to_string(),
        analyzer_ip: analyzer_ip.to_string(),
        vtap_type: 1,
    }
}

pub fn controller(ip: &str, prefix: &str) -> Controller {
    Controller {
        lcuuid: format!("controller-{}", ip),
        ip: ip.to_string(),
        region_domain_prefix: prefix.to_string(),
    }
}

pub fn controller_conn(region: &str, controller_ip: &str) -> AzControllerConnection {
    AzControllerConnection {
        az: "ALL".to_string(),
        region: region.to_string(),
        controller_ip: controller_ip.to_string(),
    }
}

/// One region `R`, one AZ `z1`, analyzers X (10.0.0.1) and Y (10.0.0.2)
/// both eligible, four probes all on X.
pub fn busy_analyzer_snapshot() -> InventorySnapshot {
    InventorySnapshot {
        azs: vec![az("z1", "R")],
        analyzers: vec![analyzer("x", "10.0.0.1"), analyzer("y", "10.0.0.2")],
        az_analyzer_conns: vec![az_conn("z1", "R", "10.0.0.1"), az_conn("z1", "R", "10.0.0.2")],
        vtaps: vec![
            vtap("a", "z1", "R", "10.0.0.1"),
            vtap("b", "z1", "R", "10.0.0.1"),
            vtap("c", "z1", "R", "10.0.0.1"),
            vtap("d", "z1", "R", "10.0.0.1"),
        ],
        ..Default::default()
    }
}

/// Traffic matching `busy_analyzer_snapshot`: 60, 30, 10, 10
pub fn busy_analyzer_traffic() -> FixtureSampler {
    FixtureSampler::new().with_traffic("", &[("a", 60), ("b", 30), ("c", 10), ("d", 10)])
}
