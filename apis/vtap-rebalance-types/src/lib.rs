// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Shared types for the VTap rebalancer service and its admin CLI.
//!
//! This crate holds the inventory records the rebalancer reads (availability
//! zones, analyzers, probes and the connections between them), the
//! rebalance mode, and the report structures returned to callers.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, VariantNames};

// ============================================================================
// Type Aliases
// ============================================================================

/// Stable inventory identifier (lcuuid string)
pub type Lcuuid = String;

/// Probe name, the key traffic samples are reported under
pub type VTapName = String;

/// Analyzer address as recorded on probes and AZ connections
pub type AnalyzerIp = String;

// ============================================================================
// Constants
// ============================================================================

/// AZ value on an analyzer connection meaning "every AZ of the region"
pub const AZ_WILDCARD: &str = "ALL";

/// Probe type code for tunnel-decapsulation probes. These are pinned to
/// their analyzer and never rebalanced.
pub const VTAP_TYPE_TUNNEL_DECAPSULATION: i32 = 11;

// ============================================================================
// Enums
// ============================================================================

/// How probe weight is measured when balancing.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    VariantNames,
    EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceType {
    /// Every probe weighs 1; balance probe counts
    Weight,
    /// Probes weigh their sampled traffic over the measurement window
    #[default]
    Traffic,
}

/// Administrative state of an analyzer.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerState {
    Enabled,
    #[default]
    Disabled,
}

impl AnalyzerState {
    /// Integer code stored in the inventory and reported as `STATE`
    pub fn code(self) -> i32 {
        match self {
            AnalyzerState::Enabled => 1,
            AnalyzerState::Disabled => 0,
        }
    }

    /// Decode a stored state; anything unrecognized is treated as disabled.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => AnalyzerState::Enabled,
            _ => AnalyzerState::Disabled,
        }
    }
}

// ============================================================================
// Inventory Records
// ============================================================================

/// An availability zone and the region it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AvailabilityZone {
    pub lcuuid: Lcuuid,
    #[serde(default)]
    pub name: String,
    pub region: Lcuuid,
}

/// A data-collection analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Analyzer {
    pub lcuuid: Lcuuid,
    #[serde(default)]
    pub name: String,
    pub ip: AnalyzerIp,
    pub state: AnalyzerState,
}

impl Analyzer {
    pub fn is_enabled(&self) -> bool {
        self.state == AnalyzerState::Enabled
    }
}

/// Declares that an analyzer may serve an AZ (or, with the wildcard, every
/// AZ of a region).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AzAnalyzerConnection {
    pub az: String,
    pub region: Lcuuid,
    pub analyzer_ip: AnalyzerIp,
}

impl AzAnalyzerConnection {
    pub fn is_wildcard(&self) -> bool {
        self.az == AZ_WILDCARD
    }
}

/// A traffic probe and its current analyzer assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VTap {
    pub lcuuid: Lcuuid,
    pub name: VTapName,
    pub az: Lcuuid,
    pub region: Lcuuid,
    /// Empty when the probe has no analyzer yet
    #[serde(default)]
    pub analyzer_ip: AnalyzerIp,
    #[serde(rename = "type")]
    pub vtap_type: i32,
}

impl VTap {
    /// Pinned probes stay with their analyzer and are never moved.
    pub fn is_pinned(&self) -> bool {
        self.vtap_type == VTAP_TYPE_TUNNEL_DECAPSULATION
    }

    pub fn current_analyzer(&self) -> Option<&str> {
        if self.analyzer_ip.is_empty() {
            None
        } else {
            Some(&self.analyzer_ip)
        }
    }
}

/// A controller; only its region domain prefix matters to the rebalancer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Controller {
    pub lcuuid: Lcuuid,
    pub ip: String,
    /// Host-name prefix used to reach services of a remote region; empty for
    /// the local region
    #[serde(default)]
    pub region_domain_prefix: String,
}

/// Declares that a controller serves an AZ (or every AZ of a region).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AzControllerConnection {
    pub az: String,
    pub region: Lcuuid,
    pub controller_ip: String,
}

// ============================================================================
// Plan and Resolver Output
// ============================================================================

/// One probe reassignment in a rebalance plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProbeMove {
    pub vtap_lcuuid: Lcuuid,
    pub vtap_name: VTapName,
    pub az: Lcuuid,
    /// Previous analyzer; `None` when the probe had none
    pub from_ip: Option<AnalyzerIp>,
    pub to_ip: AnalyzerIp,
}

/// Analyzers eligible to serve one AZ, in eligibility order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AzAnalyzers {
    pub az: Lcuuid,
    pub analyzers: Vec<Analyzer>,
}

// ============================================================================
// Report Types
// ============================================================================

/// Before/after summary for one analyzer in one AZ.
///
/// The debug fields are populated for logging and tests but are never
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct HostVTapRebalanceResult {
    pub ip: AnalyzerIp,
    pub az: Lcuuid,
    /// Analyzer state code
    pub state: i32,
    pub before_vtap_num: u64,
    pub after_vtap_num: u64,
    /// Probes added to plus probes removed from this analyzer
    pub switch_vtap_num: u64,
    /// Load before the plan relative to the AZ's ideal share
    pub before_vtap_weights: f64,
    /// Load after the plan relative to the AZ's ideal share
    pub after_vtap_weights: f64,

    #[serde(skip)]
    pub new_vtap_to_traffic: BTreeMap<VTapName, u64>,
    #[serde(skip)]
    pub del_vtap_to_traffic: BTreeMap<VTapName, u64>,
    #[serde(skip)]
    pub before_vtap_traffic: u64,
    #[serde(skip)]
    pub after_vtap_traffic: u64,
}

/// Per-AZ rebalance summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AZVTapRebalanceResult {
    /// Number of probes whose analyzer changed; each probe counted once
    pub total_switch_vtap_num: u64,
    pub details: Vec<HostVTapRebalanceResult>,
}

/// Result of one rebalance run across all AZs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VTapRebalanceResult {
    pub total_switch_vtap_num: u64,
    pub details: Vec<HostVTapRebalanceResult>,
}

impl VTapRebalanceResult {
    /// Concatenate per-AZ results in the order given.
    pub fn from_az_results<I>(az_results: I) -> Self
    where
        I: IntoIterator<Item = AZVTapRebalanceResult>,
    {
        let mut result = VTapRebalanceResult::default();
        for az in az_results {
            result.total_switch_vtap_num += az.total_switch_vtap_num;
            result.details.extend(az.details);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Gen, QuickCheck};
    use quickcheck_helpers::random;
    use std::str::FromStr;

    #[test]
    fn analyzer_state_code_round_trip() {
        assert_eq!(AnalyzerState::from_code(1), AnalyzerState::Enabled);
        assert_eq!(AnalyzerState::from_code(0), AnalyzerState::Disabled);
        assert_eq!(AnalyzerState::Enabled.code(), 1);
        assert_eq!(AnalyzerState::Disabled.code(), 0);
    }

    #[test]
    fn unknown_analyzer_state_is_disabled() {
        fn prop(code: i32) -> bool {
            code == 1 || AnalyzerState::from_code(code) == AnalyzerState::Disabled
        }
        QuickCheck::new().quickcheck(prop as fn(i32) -> bool);
    }

    #[test]
    fn rebalance_type_parses_case_insensitively() {
        assert_eq!(
            RebalanceType::from_str("traffic").ok(),
            Some(RebalanceType::Traffic)
        );
        assert_eq!(
            RebalanceType::from_str("WEIGHT").ok(),
            Some(RebalanceType::Weight)
        );
        assert!(RebalanceType::from_str("bytes").is_err());
        assert_eq!(RebalanceType::default(), RebalanceType::Traffic);
        assert_eq!(RebalanceType::Weight.to_string(), "weight");
    }

    #[test]
    fn wildcard_connection() {
        let conn = AzAnalyzerConnection {
            az: AZ_WILDCARD.to_string(),
            region: "r1".to_string(),
            analyzer_ip: "10.0.0.1".to_string(),
        };
        assert!(conn.is_wildcard());

        let named = AzAnalyzerConnection {
            az: "az-1".to_string(),
            ..conn
        };
        assert!(!named.is_wildcard());
    }

    #[test]
    fn pinned_probes() {
        let mut g = Gen::new(16);
        let mut vtap = VTap {
            lcuuid: random::string(&mut g, 8),
            name: random::string(&mut g, 8),
            az: "az-1".to_string(),
            region: "r1".to_string(),
            analyzer_ip: String::new(),
            vtap_type: VTAP_TYPE_TUNNEL_DECAPSULATION,
        };
        assert!(vtap.is_pinned());
        assert_eq!(vtap.current_analyzer(), None);

        vtap.vtap_type = 1;
        vtap.analyzer_ip = "10.0.0.1".to_string();
        assert!(!vtap.is_pinned());
        assert_eq!(vtap.current_analyzer(), Some("10.0.0.1"));
    }

    #[test]
    fn host_result_hides_debug_fields() {
        let mut host = HostVTapRebalanceResult {
            ip: "10.0.0.1".to_string(),
            az: "az-1".to_string(),
            state: 1,
            before_vtap_num: 2,
            after_vtap_num: 1,
            switch_vtap_num: 1,
            before_vtap_weights: 1.5,
            after_vtap_weights: 1.0,
            before_vtap_traffic: 300,
            after_vtap_traffic: 200,
            ..Default::default()
        };
        host.del_vtap_to_traffic.insert("probe-a".to_string(), 100);

        let value = serde_json::to_value(&host).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 8);
        assert_eq!(obj["IP"], "10.0.0.1");
        assert_eq!(obj["AZ"], "az-1");
        assert_eq!(obj["STATE"], 1);
        assert_eq!(obj["BEFORE_VTAP_NUM"], 2);
        assert_eq!(obj["AFTER_VTAP_NUM"], 1);
        assert_eq!(obj["SWITCH_VTAP_NUM"], 1);
        assert_eq!(obj["BEFORE_VTAP_WEIGHTS"], 1.5);
        assert_eq!(obj["AFTER_VTAP_WEIGHTS"], 1.0);

        // Debug breakdowns come back empty on the other side
        let back: HostVTapRebalanceResult = serde_json::from_value(value).unwrap();
        assert!(back.del_vtap_to_traffic.is_empty());
        assert_eq!(back.before_vtap_traffic, 0);
    }

    #[test]
    fn global_result_concatenates_az_results() {
        let host = |az: &str, ip: &str| HostVTapRebalanceResult {
            ip: ip.to_string(),
            az: az.to_string(),
            ..Default::default()
        };
        let az1 = AZVTapRebalanceResult {
            total_switch_vtap_num: 3,
            details: vec![host("az-1", "10.0.0.1"), host("az-1", "10.0.0.2")],
        };
        let az2 = AZVTapRebalanceResult {
            total_switch_vtap_num: 1,
            details: vec![host("az-2", "10.0.1.1")],
        };

        let result = VTapRebalanceResult::from_az_results(vec![az1, az2]);
        assert_eq!(result.total_switch_vtap_num, 4);
        let ips: Vec<&str> = result.details.iter().map(|h| h.ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2", "10.0.1.1"]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["TOTAL_SWITCH_VTAP_NUM"], 4);
        assert_eq!(json["DETAILS"].as_array().unwrap().len(), 3);
    }
}
