// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Dropshot API trait for the VTap rebalancer service.
//!
//! The rebalancer redistributes traffic probes (VTaps) across the analyzers
//! eligible to serve each availability zone, so that per-analyzer load is
//! as even as possible while moving few probes.
//!
//! ## Endpoints
//!
//! - `POST /v1/rebalance-vtap` - Compute (and optionally apply) a plan
//! - `GET /v1/az-analyzers` - List the analyzers eligible for each AZ
//! - `GET /metrics` - Prometheus metrics

use dropshot::{Body, HttpError, HttpResponseOk, Query, RequestContext};
use http::Response;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vtap_rebalance_types::{AzAnalyzers, RebalanceType, VTapRebalanceResult};

/// Query parameters for a rebalance run.
///
/// Every field is optional; missing values fall back to the service's
/// current configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct RebalanceQuery {
    /// Weight measurement: `weight` (probe count) or `traffic`
    #[serde(rename = "type")]
    pub rebalance_type: Option<RebalanceType>,
    /// Length of the traffic measurement window in seconds
    pub data_duration: Option<u64>,
    /// End of the traffic measurement window (unix seconds); defaults to now
    pub end_time: Option<i64>,
    /// Write the plan back to the inventory instead of only reporting it
    pub apply: Option<bool>,
}

/// VTap Rebalancer API
#[dropshot::api_description {
    module = "vtap_rebalance_api_mod",
}]
pub trait VTapRebalanceApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    /// Rebalance probes across analyzers
    ///
    /// Loads the inventory, samples per-probe traffic when `type=traffic`,
    /// plans a new assignment per AZ and returns a before/after report for
    /// every analyzer the plan touches.
    ///
    /// Returns 400 for an invalid measurement window.
    /// Returns 503 if the inventory or the traffic source is unavailable.
    #[endpoint {
        method = POST,
        path = "/v1/rebalance-vtap",
        tags = ["rebalance"],
    }]
    async fn rebalance_vtap(
        rqctx: RequestContext<Self::Context>,
        query: Query<RebalanceQuery>,
    ) -> Result<HttpResponseOk<VTapRebalanceResult>, HttpError>;

    /// List eligible analyzers per AZ
    ///
    /// Resolves AZ-analyzer connections (including region-wide `ALL`
    /// entries) against the current inventory.
    #[endpoint {
        method = GET,
        path = "/v1/az-analyzers",
        tags = ["rebalance"],
    }]
    async fn list_az_analyzers(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<Vec<AzAnalyzers>>, HttpError>;

    /// Prometheus metrics in text exposition format
    #[endpoint {
        method = GET,
        path = "/metrics",
        tags = ["system"],
    }]
    async fn metrics(rqctx: RequestContext<Self::Context>) -> Result<Response<Body>, HttpError>;
}
