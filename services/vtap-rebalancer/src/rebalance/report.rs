// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Before/after reporting for one AZ's plan

use std::collections::{BTreeMap, HashMap};

use vtap_rebalance_types::{AZVTapRebalanceResult, Analyzer, AnalyzerIp, HostVTapRebalanceResult};

use super::planner::ProbeLoad;

#[derive(Default)]
struct HostTally {
    before_num: u64,
    after_num: u64,
    before_load: u128,
    after_load: u128,
    result: HostVTapRebalanceResult,
}

/// Summarize a plan for one AZ.
///
/// Every known analyzer holding at least one of the AZ's probes before or
/// after the plan gets a row, ordered by address. `targets` is parallel to
/// `probes`; `candidate_count` is the number of analyzers the load was
/// spread over and defines the ideal share.
pub fn az_result(
    az: &str,
    probes: &[ProbeLoad],
    targets: &[Option<AnalyzerIp>],
    candidate_count: usize,
    analyzers_by_ip: &HashMap<&str, &Analyzer>,
) -> AZVTapRebalanceResult {
    let mut hosts: BTreeMap<&str, HostTally> = BTreeMap::new();
    let mut total_switch_vtap_num = 0;
    let mut total_load: u128 = 0;

    for (probe, target) in probes.iter().zip(targets) {
        let weight = u128::from(probe.weight);
        total_load += weight;

        let before = probe.current.as_deref();
        let after = target.as_deref();

        if let Some(ip) = before {
            let host = hosts.entry(ip).or_default();
            host.before_num += 1;
            host.before_load += weight;
            host.result.before_vtap_traffic =
                host.result.before_vtap_traffic.saturating_add(probe.traffic);
        }
        if let Some(ip) = after {
            let host = hosts.entry(ip).or_default();
            host.after_num += 1;
            host.after_load += weight;
            host.result.after_vtap_traffic =
                host.result.after_vtap_traffic.saturating_add(probe.traffic);
        }

        if after.is_some() && before != after {
            total_switch_vtap_num += 1;
            if let Some(ip) = before {
                hosts
                    .entry(ip)
                    .or_default()
                    .result
                    .del_vtap_to_traffic
                    .insert(probe.name.clone(), probe.traffic);
            }
            if let Some(ip) = after {
                hosts
                    .entry(ip)
                    .or_default()
                    .result
                    .new_vtap_to_traffic
                    .insert(probe.name.clone(), probe.traffic);
            }
        }
    }

    let ideal_share = if candidate_count == 0 {
        0.0
    } else {
        total_load as f64 / candidate_count as f64
    };

    let details = hosts
        .into_iter()
        .filter_map(|(ip, tally)| {
            let Some(analyzer) = analyzers_by_ip.get(ip) else {
                tracing::debug!(az = %az, ip = %ip, "Not reporting unknown analyzer");
                return None;
            };
            let switched =
                tally.result.new_vtap_to_traffic.len() + tally.result.del_vtap_to_traffic.len();
            Some(HostVTapRebalanceResult {
                ip: ip.to_string(),
                az: az.to_string(),
                state: analyzer.state.code(),
                before_vtap_num: tally.before_num,
                after_vtap_num: tally.after_num,
                switch_vtap_num: switched as u64,
                before_vtap_weights: relative_load(tally.before_load, ideal_share),
                after_vtap_weights: relative_load(tally.after_load, ideal_share),
                ..tally.result
            })
        })
        .collect();

    AZVTapRebalanceResult {
        total_switch_vtap_num,
        details,
    }
}

/// Load as a multiple of the ideal share, to two decimals.
fn relative_load(load: u128, ideal_share: f64) -> f64 {
    if ideal_share <= 0.0 {
        return 0.0;
    }
    (load as f64 / ideal_share * 100.0).round() / 100.0
}
