// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Per-AZ probe placement
//!
//! Placement is a largest-weight-first greedy pass over the probes of one
//! AZ. A probe keeps its analyzer while that analyzer is still below the
//! ideal share; otherwise it goes to the least-loaded candidate. Every
//! analyzer therefore ends below the ideal share plus one probe weight.
//!
//! The placement order depends only on probe weights and identifiers, never
//! on the current assignment. Running the planner on its own output
//! therefore keeps every probe where it is.

use std::cmp::Reverse;
use std::collections::HashMap;

use vtap_rebalance_types::{Analyzer, AnalyzerIp, Lcuuid, VTap, VTapName};

/// One rebalanceable probe and the weight it contributes to its analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeLoad {
    pub lcuuid: Lcuuid,
    pub name: VTapName,
    pub current: Option<AnalyzerIp>,
    pub weight: u64,
    /// Sampled traffic, zero when traffic was not sampled
    pub traffic: u64,
}

impl ProbeLoad {
    pub fn new(vtap: &VTap, weight: u64, traffic: u64) -> Self {
        Self {
            lcuuid: vtap.lcuuid.clone(),
            name: vtap.name.clone(),
            current: vtap.current_analyzer().map(str::to_string),
            weight,
            traffic,
        }
    }
}

/// Compute the target analyzer of every probe in one AZ.
///
/// `candidates` are the enabled analyzers eligible for the AZ. The result is
/// parallel to `probes`. With no candidates every probe keeps its current
/// analyzer. Probes on an analyzer that is not a candidate always move.
pub fn plan_az(candidates: &[&Analyzer], probes: &[ProbeLoad]) -> Vec<Option<AnalyzerIp>> {
    if candidates.is_empty() {
        return probes.iter().map(|p| p.current.clone()).collect();
    }

    let mut candidates = candidates.to_vec();
    candidates.sort_by(|a, b| a.lcuuid.cmp(&b.lcuuid));
    candidates.dedup_by(|a, b| a.lcuuid == b.lcuuid);

    let index_by_ip: HashMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, a)| (a.ip.as_str(), i))
        .collect();

    let n = candidates.len() as u128;
    let total: u128 = probes.iter().map(|p| u128::from(p.weight)).sum();
    let mut loads = vec![0u128; candidates.len()];

    let mut order: Vec<usize> = (0..probes.len()).collect();
    order.sort_by_key(|&i| (Reverse(probes[i].weight), &probes[i].lcuuid));

    let mut targets = vec![None; probes.len()];
    for i in order {
        let probe = &probes[i];
        let weight = u128::from(probe.weight);
        let current = probe
            .current
            .as_deref()
            .and_then(|ip| index_by_ip.get(ip).copied());

        let target = match current {
            Some(c) if weight == 0 || loads[c] * n < total => c,
            _ => least_loaded(&loads, current),
        };

        loads[target] += weight;
        targets[i] = Some(candidates[target].ip.clone());
    }

    targets
}

/// Index of the least-loaded candidate. Ties go to the probe's current
/// analyzer, then to the lowest identifier (candidates are sorted).
fn least_loaded(loads: &[u128], current: Option<usize>) -> usize {
    (0..loads.len())
        .min_by_key(|&i| (loads[i], current != Some(i), i))
        .unwrap_or(0)
}
