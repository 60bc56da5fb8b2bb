// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Querier client for sampling per-probe traffic
//!
//! The querier aggregates flow metrics. The rebalancer asks it for the
//! total bytes each probe reported over a time window, one request per
//! region. Remote regions are reached by prefixing the querier host name
//! with the region's domain prefix.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use vtap_rebalance_types::VTapName;

/// Metrics database the traffic query runs against
const QUERIER_DB: &str = "flow_metrics";

const QUERY_PATH: &str = "/v1/query/";

const VTAP_COLUMN: &str = "vtap";

const TRAFFIC_COLUMN: &str = "traffic";

/// Querier client errors
#[derive(Debug, Error)]
pub enum QuerierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Querier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed querier response: {0}")]
    Decode(String),

    #[error("Invalid querier URL: {0}")]
    InvalidUrl(String),
}

/// Window length is zero or the window start is not representable
#[derive(Debug, Error)]
#[error("Invalid traffic window: end {end}, duration {duration_secs}s")]
pub struct InvalidWindow {
    pub end: i64,
    pub duration_secs: u64,
}

/// Half-open measurement window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TrafficWindow {
    /// Window of `duration_secs` seconds ending at `end`.
    pub fn new(end: DateTime<Utc>, duration_secs: u64) -> Result<Self, InvalidWindow> {
        let invalid = || InvalidWindow {
            end: end.timestamp(),
            duration_secs,
        };
        if duration_secs == 0 {
            return Err(invalid());
        }
        let span = i64::try_from(duration_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(invalid)?;
        let start = end.checked_sub_signed(span).ok_or_else(invalid)?;
        Ok(Self { start, end })
    }

    /// Window ending at the unix timestamp `end_secs`, or now when absent.
    pub fn ending_at(end_secs: Option<i64>, duration_secs: u64) -> Result<Self, InvalidWindow> {
        let end = match end_secs {
            Some(secs) => DateTime::from_timestamp(secs, 0).ok_or(InvalidWindow {
                end: secs,
                duration_secs,
            })?,
            None => Utc::now(),
        };
        Self::new(end, duration_secs)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Source of per-probe traffic samples.
#[async_trait]
pub trait TrafficSampler: Send + Sync {
    /// Total traffic per probe name over `window`, in the region reached
    /// through `domain_prefix` (empty for the local region).
    ///
    /// Probes that reported nothing are simply absent from the map.
    async fn traffic_by_window(
        &self,
        domain_prefix: &str,
        window: &TrafficWindow,
    ) -> Result<HashMap<VTapName, u64>, QuerierError>;
}

/// Raw querier response envelope
#[derive(Debug, Deserialize)]
struct QuerierResponse {
    #[serde(rename = "OPT_STATUS", default)]
    opt_status: Option<String>,
    #[serde(rename = "DESCRIPTION", default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// HTTP traffic sampler backed by the querier service
pub struct QuerierClient {
    client: Client,
    base_url: Url,
}

impl QuerierClient {
    /// Create a new querier client
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, QuerierError> {
        crate::install_crypto_provider();

        let base_url =
            Url::parse(base_url).map_err(|e| QuerierError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.host_str().is_none() {
            return Err(QuerierError::InvalidUrl(format!(
                "{}: missing host",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Query endpoint for the region reached through `domain_prefix`.
    pub fn endpoint_for(&self, domain_prefix: &str) -> Result<Url, QuerierError> {
        let mut url = self.base_url.clone();
        if !domain_prefix.is_empty() {
            let host = url
                .host_str()
                .ok_or_else(|| QuerierError::InvalidUrl(url.to_string()))?;
            let prefixed = format!("{}{}", domain_prefix, host);
            url.set_host(Some(&prefixed))
                .map_err(|e| QuerierError::InvalidUrl(format!("{}: {}", prefixed, e)))?;
        }
        url.set_path(QUERY_PATH);
        Ok(url)
    }
}

#[async_trait]
impl TrafficSampler for QuerierClient {
    async fn traffic_by_window(
        &self,
        domain_prefix: &str,
        window: &TrafficWindow,
    ) -> Result<HashMap<VTapName, u64>, QuerierError> {
        let url = self.endpoint_for(domain_prefix)?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("db", QUERIER_DB)
            .append_pair("sql", &traffic_sql(window))
            .finish();

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                url = %url,
                status = %status,
                "Querier returned non-success status"
            );
            return Err(QuerierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QuerierResponse = response
            .json()
            .await
            .map_err(|e| QuerierError::Decode(e.to_string()))?;
        let traffic = decode_traffic(parsed)?;

        tracing::debug!(
            domain_prefix = %domain_prefix,
            vtaps = traffic.len(),
            "Sampled probe traffic"
        );

        Ok(traffic)
    }
}

/// Aggregation of bytes per probe over the window.
fn traffic_sql(window: &TrafficWindow) -> String {
    format!(
        "SELECT {vtap}, Sum(byte) AS {traffic} FROM `network.1m` \
         WHERE time>={start} AND time<{end} GROUP BY {vtap}",
        vtap = VTAP_COLUMN,
        traffic = TRAFFIC_COLUMN,
        start = window.start().timestamp(),
        end = window.end().timestamp(),
    )
}

fn decode_traffic(response: QuerierResponse) -> Result<HashMap<VTapName, u64>, QuerierError> {
    if let Some(status) = &response.opt_status {
        if status != "SUCCESS" {
            return Err(QuerierError::Query(format!(
                "{}: {}",
                status,
                response.description.unwrap_or_default()
            )));
        }
    }

    let Some(result) = response.result else {
        return Ok(HashMap::new());
    };

    let column = |name: &str| {
        result
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| QuerierError::Decode(format!("missing column '{}'", name)))
    };
    let vtap_idx = column(VTAP_COLUMN)?;
    let traffic_idx = column(TRAFFIC_COLUMN)?;

    let mut traffic: HashMap<VTapName, u64> = HashMap::new();
    for row in &result.values {
        let name = row
            .get(vtap_idx)
            .and_then(|v| v.as_str())
            .ok_or_else(|| QuerierError::Decode(format!("bad probe name in row {:?}", row)))?;
        let bytes = row
            .get(traffic_idx)
            .and_then(as_traffic)
            .ok_or_else(|| QuerierError::Decode(format!("bad traffic value in row {:?}", row)))?;

        let entry = traffic.entry(name.to_string()).or_default();
        *entry = entry.saturating_add(bytes);
    }

    Ok(traffic)
}

/// Non-negative integer traffic; whole floats are accepted, `null` is zero.
fn as_traffic(value: &serde_json::Value) -> Option<u64> {
    if value.is_null() {
        return Some(0);
    }
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => {
            Some(f as u64)
        }
        _ => None,
    }
}
