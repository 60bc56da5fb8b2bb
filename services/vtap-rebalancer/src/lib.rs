// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! VTap Rebalancer Library
//!
//! Redistributes traffic probes (VTaps) across the analyzers eligible to
//! serve each availability zone. The library holds the inventory gateway,
//! the traffic sampler client, the planning engine and the HTTP API
//! implementation; `main.rs` only wires them to a dropshot server.

pub mod config;
pub mod context;
pub mod db;
pub mod inventory;
pub mod metrics;
pub mod querier;
pub mod rebalance;

use dropshot::{Body, HttpError, HttpResponseOk, Query, RequestContext};
use http::Response;
use vtap_rebalance_api::{RebalanceQuery, VTapRebalanceApi};
use vtap_rebalance_types::{AzAnalyzers, VTapRebalanceResult};

use crate::context::ApiContext;
use crate::rebalance::RebalanceError;

/// Install the process-wide rustls crypto provider.
///
/// reqwest is built without a default provider. Safe to call repeatedly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Map a run failure to the HTTP status callers should see
pub fn to_http_error(err: RebalanceError) -> HttpError {
    match err {
        RebalanceError::InvalidWindow(_) => HttpError::for_bad_request(None, err.to_string()),
        RebalanceError::Inventory(_) | RebalanceError::Traffic { .. } => {
            HttpError::for_unavail(None, err.to_string())
        }
        RebalanceError::Apply(_) => HttpError::for_internal_error(err.to_string()),
    }
}

/// VTap Rebalancer API implementation
pub enum VTapRebalancerImpl {}

impl VTapRebalanceApi for VTapRebalancerImpl {
    type Context = ApiContext;

    async fn rebalance_vtap(
        rqctx: RequestContext<Self::Context>,
        query: Query<RebalanceQuery>,
    ) -> Result<HttpResponseOk<VTapRebalanceResult>, HttpError> {
        let ctx = rqctx.context();
        let query = query.into_inner();

        tracing::info!(query = ?query, "Received rebalance request");

        let result = ctx.rebalance(&query).await.map_err(to_http_error)?;

        Ok(HttpResponseOk(result))
    }

    async fn list_az_analyzers(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<Vec<AzAnalyzers>>, HttpError> {
        let ctx = rqctx.context();

        let azs = ctx.az_analyzers().await.map_err(to_http_error)?;

        Ok(HttpResponseOk(azs))
    }

    async fn metrics(_rqctx: RequestContext<Self::Context>) -> Result<Response<Body>, HttpError> {
        Response::builder()
            .status(200)
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(metrics::gather_metrics().into())
            .map_err(|e| HttpError::for_internal_error(format!("Failed to build response: {}", e)))
    }
}
