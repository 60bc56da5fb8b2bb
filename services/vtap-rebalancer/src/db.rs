// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! PostgreSQL inventory gateway using tokio-postgres
//!
//! Reads the AZ, analyzer, probe and controller tables in one pipelined
//! round trip and writes applied plans back in a single transaction.

use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use vtap_rebalance_types::{
    Analyzer, AnalyzerState, AvailabilityZone, AzAnalyzerConnection, AzControllerConnection,
    Controller, ProbeMove, VTAP_TYPE_TUNNEL_DECAPSULATION, VTap,
};

use crate::inventory::{InventoryError, InventoryGateway, InventorySnapshot};

impl From<tokio_postgres::Error> for InventoryError {
    fn from(e: tokio_postgres::Error) -> Self {
        InventoryError::Query(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for InventoryError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        InventoryError::Connection(e.to_string())
    }
}

const SELECT_AZS: &str = "SELECT lcuuid, name, region FROM az";

const SELECT_ANALYZERS: &str = "SELECT lcuuid, name, ip, state FROM analyzer";

const SELECT_AZ_ANALYZER_CONNS: &str =
    "SELECT az, region, analyzer_ip FROM az_analyzer_connection";

const SELECT_VTAPS: &str =
    "SELECT lcuuid, name, az, region, analyzer_ip, type FROM vtap WHERE type != $1";

const SELECT_CONTROLLERS: &str = "SELECT lcuuid, ip, region_domain_prefix FROM controller";

const SELECT_AZ_CONTROLLER_CONNS: &str =
    "SELECT az, region, controller_ip FROM az_controller_connection";

const UPDATE_VTAP_ANALYZER: &str = "UPDATE vtap SET analyzer_ip = $1 WHERE lcuuid = $2";

/// Inventory backed by a PostgreSQL connection pool
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Create a new database connection pool from a connection URL
    pub async fn new(database_url: &str) -> Result<Self, InventoryError> {
        database_url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| InventoryError::Connection(format!("Invalid database URL: {}", e)))?;

        let mut cfg = Config::new();
        cfg.url = Some(database_url.to_string());

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| InventoryError::Connection(format!("Failed to create pool: {}", e)))?;

        let client = pool.get().await?;
        client.execute("SELECT 1", &[]).await.map_err(|e| {
            InventoryError::Connection(format!("Failed to connect to database: {}", e))
        })?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl InventoryGateway for Database {
    async fn load_snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        let client = self.pool.get().await?;
        let pinned_type = VTAP_TYPE_TUNNEL_DECAPSULATION;
        let vtap_params: [&(dyn ToSql + Sync); 1] = [&pinned_type];

        // tokio-postgres pipelines concurrent queries on one connection.
        let (azs, analyzers, az_analyzer_conns, vtaps, controllers, az_controller_conns) = tokio::try_join!(
            client.query(SELECT_AZS, &[]),
            client.query(SELECT_ANALYZERS, &[]),
            client.query(SELECT_AZ_ANALYZER_CONNS, &[]),
            client.query(SELECT_VTAPS, &vtap_params),
            client.query(SELECT_CONTROLLERS, &[]),
            client.query(SELECT_AZ_CONTROLLER_CONNS, &[]),
        )?;

        let snapshot = InventorySnapshot {
            azs: map_rows(&azs, az_from_row)?,
            analyzers: map_rows(&analyzers, analyzer_from_row)?,
            az_analyzer_conns: map_rows(&az_analyzer_conns, az_analyzer_conn_from_row)?,
            vtaps: map_rows(&vtaps, vtap_from_row)?,
            controllers: map_rows(&controllers, controller_from_row)?,
            az_controller_conns: map_rows(&az_controller_conns, az_controller_conn_from_row)?,
        };

        tracing::debug!(
            azs = snapshot.azs.len(),
            analyzers = snapshot.analyzers.len(),
            vtaps = snapshot.vtaps.len(),
            controllers = snapshot.controllers.len(),
            "Loaded inventory snapshot"
        );

        Ok(snapshot)
    }

    async fn apply_assignments(&self, moves: &[ProbeMove]) -> Result<(), InventoryError> {
        if moves.is_empty() {
            return Ok(());
        }

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        let stmt = tx.prepare(UPDATE_VTAP_ANALYZER).await?;

        for m in moves {
            let updated = tx.execute(&stmt, &[&m.to_ip, &m.vtap_lcuuid]).await?;
            if updated == 0 {
                tracing::warn!(
                    vtap = %m.vtap_name,
                    lcuuid = %m.vtap_lcuuid,
                    "Probe disappeared before the plan was applied"
                );
            }
        }

        tx.commit().await?;

        tracing::info!(moves = moves.len(), "Applied probe assignments");
        Ok(())
    }
}

fn map_rows<T>(
    rows: &[Row],
    f: fn(&Row) -> Result<T, tokio_postgres::Error>,
) -> Result<Vec<T>, InventoryError> {
    rows.iter()
        .map(|row| f(row).map_err(InventoryError::from))
        .collect()
}

fn az_from_row(row: &Row) -> Result<AvailabilityZone, tokio_postgres::Error> {
    Ok(AvailabilityZone {
        lcuuid: row.try_get("lcuuid")?,
        name: row.try_get::<_, Option<String>>("name")?.unwrap_or_default(),
        region: row.try_get("region")?,
    })
}

fn analyzer_from_row(row: &Row) -> Result<Analyzer, tokio_postgres::Error> {
    Ok(Analyzer {
        lcuuid: row.try_get("lcuuid")?,
        name: row.try_get::<_, Option<String>>("name")?.unwrap_or_default(),
        ip: row.try_get("ip")?,
        state: AnalyzerState::from_code(row.try_get("state")?),
    })
}

fn az_analyzer_conn_from_row(row: &Row) -> Result<AzAnalyzerConnection, tokio_postgres::Error> {
    Ok(AzAnalyzerConnection {
        az: row.try_get("az")?,
        region: row.try_get("region")?,
        analyzer_ip: row.try_get("analyzer_ip")?,
    })
}

fn vtap_from_row(row: &Row) -> Result<VTap, tokio_postgres::Error> {
    Ok(VTap {
        lcuuid: row.try_get("lcuuid")?,
        name: row.try_get("name")?,
        az: row.try_get("az")?,
        region: row.try_get("region")?,
        analyzer_ip: row
            .try_get::<_, Option<String>>("analyzer_ip")?
            .unwrap_or_default(),
        vtap_type: row.try_get("type")?,
    })
}

fn controller_from_row(row: &Row) -> Result<Controller, tokio_postgres::Error> {
    Ok(Controller {
        lcuuid: row.try_get("lcuuid")?,
        ip: row.try_get("ip")?,
        region_domain_prefix: row
            .try_get::<_, Option<String>>("region_domain_prefix")?
            .unwrap_or_default(),
    })
}

fn az_controller_conn_from_row(
    row: &Row,
) -> Result<AzControllerConnection, tokio_postgres::Error> {
    Ok(AzControllerConnection {
        az: row.try_get("az")?,
        region: row.try_get("region")?,
        controller_ip: row.try_get("controller_ip")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_a_connection_error() {
        let err = Database::new("postgres://host:notaport/db")
            .await
            .err()
            .unwrap();
        match err {
            InventoryError::Connection(msg) => assert!(msg.contains("Invalid database URL")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn vtap_query_excludes_pinned_probes() {
        assert!(SELECT_VTAPS.contains("type != $1"));
        assert_eq!(VTAP_TYPE_TUNNEL_DECAPSULATION, 11);
    }
}
