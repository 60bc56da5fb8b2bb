// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! HTTP client for the VTap rebalancer service

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use vtap_rebalance_api::RebalanceQuery;
use vtap_rebalance_types::{AzAnalyzers, VTapRebalanceResult};

/// Error body returned by the service
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid service URL: {}", base_url))?;
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid endpoint path: {}", path))
    }

    /// Run a rebalance, previewing or applying per `query.apply`
    pub async fn rebalance(&self, query: &RebalanceQuery) -> Result<VTapRebalanceResult> {
        let mut url = self.endpoint("/v1/rebalance-vtap")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(t) = query.rebalance_type {
                pairs.append_pair("type", &t.to_string());
            }
            if let Some(d) = query.data_duration {
                pairs.append_pair("data_duration", &d.to_string());
            }
            if let Some(e) = query.end_time {
                pairs.append_pair("end_time", &e.to_string());
            }
            if let Some(a) = query.apply {
                pairs.append_pair("apply", &a.to_string());
            }
        }

        let response = self.http.post(url).send().await?;
        decode(response).await
    }

    /// Eligible analyzers per AZ
    pub async fn az_analyzers(&self) -> Result<Vec<AzAnalyzers>> {
        let url = self.endpoint("/v1/az-analyzers")?;
        let response = self.http.get(url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);
        return Err(anyhow!("{}: {}", status, message));
    }
    response
        .json()
        .await
        .context("Failed to parse service response")
}
