// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache controller lifecycle and the cache-first fetch path.
//!
//! The controller moves `Parsed -> Installing -> Installed -> Activating ->
//! Activated`. Install pre-populates the current generation; activation
//! deletes every other generation and claims open pages. Requests are only
//! intercepted once activated.

use std::sync::Arc;

use strum::Display;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use csutrack_config::model::WorkerConfig;
use csutrack_core::CsuError;

use crate::cache::CacheStorage;
use crate::fetcher::Fetcher;
use crate::platform::Clients;
use crate::policy::classify;
use crate::request::FetchRequest;
use crate::request::FetchResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Replaced by a newer controller or failed to activate.
    Redundant,
}

/// Result of pre-populating the cache. Failed assets do not fail install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

pub struct CacheController {
    config: WorkerConfig,
    cache: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<dyn Clients>,
    state: RwLock<WorkerState>,
}

impl CacheController {
    pub fn new(
        config: WorkerConfig,
        cache: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<dyn Clients>,
    ) -> Self {
        Self {
            config,
            cache,
            fetcher,
            clients,
            state: RwLock::new(WorkerState::Parsed),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn cache_version(&self) -> &str {
        &self.config.cache_version
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), CsuError> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(CsuError::Internal(format!(
                "cannot move to {to} from {}, expected {from}",
                *state
            )));
        }
        *state = to;
        Ok(())
    }

    /// Fetches every manifest asset into the current generation. Each asset
    /// is attempted on its own; failures are logged and reported.
    pub async fn install(&self) -> Result<InstallReport, CsuError> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)
            .await?;

        let mut report = InstallReport::default();
        for asset in self.config.install_manifest() {
            match self.precache(&asset).await {
                Ok(()) => report.cached.push(asset),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "asset not pre-cached");
                    report.failed.push((asset, e.to_string()));
                }
            }
        }

        self.transition(WorkerState::Installing, WorkerState::Installed)
            .await?;
        info!(
            generation = %self.config.cache_version,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "cache controller installed"
        );
        Ok(report)
    }

    async fn precache(&self, asset: &str) -> Result<(), CsuError> {
        let url = join_origin(&self.config.origin, asset);
        let response = self.fetcher.fetch(&FetchRequest::get(&url)).await?;
        if !response.is_cacheable() {
            return Err(CsuError::network(
                format!(
                    "{url} answered {} (redirected: {})",
                    response.status, response.redirected
                ),
                Some(response.status),
            ));
        }
        self.cache
            .put(&self.config.cache_version, &url, response)
            .await
    }

    /// Deletes every generation except the current one, then claims open
    /// pages. Returns the deleted generation names.
    pub async fn activate(&self) -> Result<Vec<String>, CsuError> {
        self.transition(WorkerState::Installed, WorkerState::Activating)
            .await?;

        match self.purge_and_claim().await {
            Ok(deleted) => {
                self.transition(WorkerState::Activating, WorkerState::Activated)
                    .await?;
                info!(generation = %self.config.cache_version, deleted = ?deleted, "cache controller activated");
                Ok(deleted)
            }
            Err(e) => {
                *self.state.write().await = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    async fn purge_and_claim(&self) -> Result<Vec<String>, CsuError> {
        let mut deleted = Vec::new();
        for generation in self.cache.keys().await? {
            if generation != self.config.cache_version && self.cache.delete(&generation).await? {
                debug!(generation = %generation, "stale cache generation deleted");
                deleted.push(generation);
            }
        }
        self.clients.claim().await?;
        Ok(deleted)
    }

    /// Serves an intercepted request. `None` means the request is not handled
    /// here and goes to the network untouched.
    pub async fn handle_fetch(
        &self,
        request: &FetchRequest,
    ) -> Result<Option<FetchResponse>, CsuError> {
        if self.state().await != WorkerState::Activated {
            return Ok(None);
        }
        let class = classify(request, &self.config);
        if !class.is_intercepted() {
            return Ok(None);
        }

        let generation = &self.config.cache_version;
        if let Some(hit) = self.cache.lookup(generation, &request.url).await? {
            debug!(url = %request.url, "cache hit");
            return Ok(Some(hit));
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_cacheable() {
            if let Err(e) = self
                .cache
                .put(generation, &request.url, response.clone())
                .await
            {
                warn!(url = %request.url, error = %e, "failed to fill cache");
            }
        } else {
            debug!(
                url = %request.url,
                status = response.status,
                redirected = response.redirected,
                "response not cached"
            );
        }
        Ok(Some(response))
    }

    /// A newer controller took over.
    pub async fn mark_redundant(&self) {
        *self.state.write().await = WorkerState::Redundant;
    }
}

fn join_origin(origin: &str, asset: &str) -> String {
    if asset.starts_with("http://") || asset.starts_with("https://") {
        asset.to_string()
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), asset.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use csutrack_core::{AdapterType, HealthStatus, PluginAdapter};

    use crate::cache::MemoryCacheStorage;
    use crate::platform::ClientWindow;

    /// Network that is always down.
    struct Unreachable;

    #[async_trait]
    impl PluginAdapter for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Fetcher
        }

        async fn health_check(&self) -> Result<HealthStatus, CsuError> {
            Ok(HealthStatus::Unhealthy("down".into()))
        }

        async fn shutdown(&self) -> Result<(), CsuError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Fetcher for Unreachable {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CsuError> {
            Err(CsuError::network(format!("{} unreachable", request.url), None))
        }
    }

    struct NoWindows;

    #[async_trait]
    impl Clients for NoWindows {
        async fn match_all(&self) -> Result<Vec<ClientWindow>, CsuError> {
            Ok(Vec::new())
        }

        async fn navigate(&self, _id: &str, _url: &str) -> Result<(), CsuError> {
            Ok(())
        }

        async fn focus(&self, _id: &str) -> Result<(), CsuError> {
            Ok(())
        }

        async fn open_window(&self, _url: &str) -> Result<String, CsuError> {
            Ok("w".into())
        }

        async fn claim(&self) -> Result<(), CsuError> {
            Ok(())
        }
    }

    fn offline_controller() -> CacheController {
        CacheController::new(
            WorkerConfig::default(),
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(Unreachable),
            Arc::new(NoWindows),
        )
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn install_with_no_network_still_completes() {
        let controller = offline_controller();
        let report = controller.install().await.unwrap();

        assert!(report.cached.is_empty());
        assert_eq!(report.failed.len(), WorkerConfig::default().install_manifest().len());
        assert_eq!(controller.state().await, WorkerState::Installed);
        assert!(logs_contain("asset not pre-cached"));
    }

    #[tokio::test]
    async fn lifecycle_steps_cannot_be_skipped() {
        let controller = offline_controller();
        assert!(controller.activate().await.is_err());
        controller.install().await.unwrap();
        assert!(controller.install().await.is_err());
        controller.activate().await.unwrap();
        assert_eq!(controller.state().await, WorkerState::Activated);
    }

    #[test]
    fn assets_join_origin() {
        assert_eq!(
            join_origin("https://a.test/", "/static/a.css"),
            "https://a.test/static/a.css"
        );
        assert_eq!(join_origin("https://a.test", "offline/"), "https://a.test/offline/");
        assert_eq!(
            join_origin("https://a.test", "https://cdn.test/x.js"),
            "https://cdn.test/x.js"
        );
    }

    #[test]
    fn state_names() {
        assert_eq!(WorkerState::Activated.to_string(), "activated");
        assert_eq!(WorkerState::Redundant.to_string(), "redundant");
    }
}
