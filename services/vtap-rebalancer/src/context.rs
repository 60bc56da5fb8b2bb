// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! API context for the VTap rebalancer

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, watch};
use tracing::Instrument;

use vtap_rebalance_api::RebalanceQuery;
use vtap_rebalance_types::{AzAnalyzers, VTapRebalanceResult};

use crate::config::RebalancerConfig;
use crate::db::Database;
use crate::inventory::InventoryGateway;
use crate::querier::{QuerierClient, TrafficSampler, TrafficWindow};
use crate::rebalance::{RebalanceError, RebalanceParams, Rebalancer, resolver};

/// API context shared across all request handlers
pub struct ApiContext {
    inventory: Arc<dyn InventoryGateway>,
    sampler: Arc<dyn TrafficSampler>,
    config: watch::Receiver<RebalancerConfig>,
    /// Serializes runs so two plans never race on the same inventory
    run_lock: Mutex<()>,
}

impl ApiContext {
    /// Create a new API context backed by PostgreSQL and the querier
    pub async fn new(config: watch::Receiver<RebalancerConfig>) -> Result<Self> {
        let current = config.borrow().clone();

        let inventory = Database::new(&current.database_url)
            .await
            .context("Failed to connect to inventory database")?;

        let sampler = QuerierClient::new(&current.querier_url, current.http_timeout_secs)
            .context("Failed to create querier client")?;

        Ok(Self::with_collaborators(
            Arc::new(inventory),
            Arc::new(sampler),
            config,
        ))
    }

    /// Create a context from arbitrary inventory and traffic sources
    pub fn with_collaborators(
        inventory: Arc<dyn InventoryGateway>,
        sampler: Arc<dyn TrafficSampler>,
        config: watch::Receiver<RebalancerConfig>,
    ) -> Self {
        Self {
            inventory,
            sampler,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Fill in request parameters from the live configuration
    pub fn params_for(&self, query: &RebalanceQuery) -> Result<RebalanceParams, RebalanceError> {
        let config = self.config.borrow();
        let duration = query.data_duration.unwrap_or(config.data_duration_secs);
        let window = TrafficWindow::ending_at(query.end_time, duration)?;

        Ok(RebalanceParams {
            rebalance_type: query.rebalance_type.unwrap_or(config.rebalance_type),
            window,
            apply: query.apply.unwrap_or(config.apply_plan),
        })
    }

    /// Run one rebalance
    pub async fn rebalance(
        &self,
        query: &RebalanceQuery,
    ) -> Result<VTapRebalanceResult, RebalanceError> {
        let params = self.params_for(query)?;
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "rebalance",
            %run_id,
            rebalance_type = %params.rebalance_type,
            apply = params.apply,
        );

        async {
            let _guard = self.run_lock.lock().await;
            tracing::info!(
                window_start = %params.window.start(),
                window_end = %params.window.end(),
                "Starting rebalance run"
            );

            let rebalancer = Rebalancer::new(self.inventory.as_ref(), self.sampler.as_ref());
            let outcome = rebalancer.run(&params).await.inspect_err(|e| {
                tracing::error!(error = %e, "Rebalance run failed");
            })?;

            match serde_json::to_string(&outcome.result) {
                Ok(json) => tracing::info!(result = %json, "Rebalance result"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize rebalance result"),
            }
            for m in &outcome.moves {
                tracing::debug!(
                    vtap = %m.vtap_name,
                    az = %m.az,
                    from = m.from_ip.as_deref().unwrap_or("-"),
                    to = %m.to_ip,
                    "Planned probe move"
                );
            }

            Ok(outcome.result)
        }
        .instrument(span)
        .await
    }

    /// Resolve the analyzers eligible for each AZ
    pub async fn az_analyzers(&self) -> Result<Vec<AzAnalyzers>, RebalanceError> {
        let snapshot = self
            .inventory
            .load_snapshot()
            .await
            .map_err(RebalanceError::Inventory)?;

        let resolved = resolver::resolve_az_analyzers(
            &snapshot.az_analyzer_conns,
            &snapshot.region_to_azs(),
            &snapshot.analyzers_by_ip(),
        );

        Ok(resolver::to_az_analyzers(&resolved))
    }
}
