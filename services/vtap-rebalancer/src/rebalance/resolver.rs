// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! AZ → eligible analyzer resolution

use std::collections::HashMap;

use vtap_rebalance_types::{Analyzer, AzAnalyzerConnection, AzAnalyzers};

use super::multimap::OrderedMultiMap;

/// Expand AZ-analyzer connections into the analyzers eligible for each AZ.
///
/// A wildcard connection applies to every AZ of its region. Connections
/// naming an unknown analyzer address are skipped. Each AZ lists its
/// analyzers once, in the order their connections first appear.
pub fn resolve_az_analyzers(
    connections: &[AzAnalyzerConnection],
    region_to_azs: &OrderedMultiMap<String, String>,
    analyzers_by_ip: &HashMap<&str, &Analyzer>,
) -> OrderedMultiMap<String, Analyzer> {
    let mut resolved = OrderedMultiMap::new();

    for conn in connections {
        let Some(analyzer) = analyzers_by_ip.get(conn.analyzer_ip.as_str()) else {
            tracing::warn!(
                analyzer_ip = %conn.analyzer_ip,
                az = %conn.az,
                region = %conn.region,
                "AZ connection refers to unknown analyzer, skipping"
            );
            continue;
        };

        if conn.is_wildcard() {
            let azs = region_to_azs.get(&conn.region);
            if azs.is_empty() {
                tracing::debug!(
                    region = %conn.region,
                    analyzer_ip = %conn.analyzer_ip,
                    "Region-wide connection matches no AZ"
                );
            }
            for az in azs {
                resolved.insert(az.clone(), (*analyzer).clone());
            }
        } else {
            resolved.insert(conn.az.clone(), (*analyzer).clone());
        }
    }

    resolved
}

/// Flatten a resolved map into its serializable form.
pub fn to_az_analyzers(resolved: &OrderedMultiMap<String, Analyzer>) -> Vec<AzAnalyzers> {
    resolved
        .iter()
        .map(|(az, analyzers)| AzAnalyzers {
            az: az.clone(),
            analyzers: analyzers.to_vec(),
        })
        .collect()
}
