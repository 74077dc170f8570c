// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network access for the cache controller.

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use csutrack_core::{AdapterType, CsuError, HealthStatus, HttpMethod, PluginAdapter};

use crate::request::{FetchRequest, FetchResponse, ResponseType};

/// Performs the network half of a fetch.
#[async_trait]
pub trait Fetcher: PluginAdapter {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CsuError>;
}

/// [`Fetcher`] backed by `reqwest`. Redirects are followed and reported
/// through [`FetchResponse::redirected`].
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: std::time::Duration) -> Result<Self, CsuError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CsuError::Network {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for HttpFetcher {
    fn name(&self) -> &str {
        "http-fetcher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Fetcher
    }

    async fn health_check(&self) -> Result<HealthStatus, CsuError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CsuError> {
        Ok(())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CsuError> {
        let requested = Url::parse(&request.url)
            .map_err(|e| CsuError::Validation(format!("invalid URL `{}`: {e}", request.url)))?;
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, requested.clone());
        if let Some(accept) = &request.accept {
            builder = builder.header(reqwest::header::ACCEPT, accept);
        }

        let response = builder.send().await.map_err(|e| CsuError::Network {
            message: format!("fetch of {} failed: {e}", request.url),
            status: None,
            source: Some(Box::new(e)),
        })?;

        let status = response.status().as_u16();
        let url = response.url().clone();
        let redirected = url != requested;
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| CsuError::Network {
            message: format!("failed to read body of {}: {e}", request.url),
            status: Some(status),
            source: Some(Box::new(e)),
        })?;

        debug!(url = %url, status, redirected, "fetched");
        Ok(FetchResponse {
            url: url.to_string(),
            status,
            headers,
            body: body.to_vec(),
            redirected,
            response_type: ResponseType::Basic,
        })
    }
}
