// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every command.

use std::sync::Arc;

use tracing::debug;

use csutrack_config::CsuConfig;
use csutrack_core::{CsuError, HealthStatus, LocalStore, Notifier, PluginAdapter, SyncTransport};
use csutrack_storage::{RetryPolicy, SqliteStore};
use csutrack_sync::{ConnectivityMonitor, HttpTransport, OfflineService, TracingNotifier};

pub struct App {
    pub config: CsuConfig,
    pub store: Arc<SqliteStore>,
    pub transport: Arc<HttpTransport>,
    pub service: OfflineService,
}

impl App {
    /// Builds the collaborators. Unless `force_offline`, the server is probed
    /// once to seed the connectivity monitor.
    pub async fn build(config: CsuConfig, force_offline: bool) -> Result<Self, CsuError> {
        let store = Arc::new(SqliteStore::new(
            config.storage.clone(),
            RetryPolicy::from(&config.sync),
        ));
        let transport = Arc::new(HttpTransport::new(&config.sync, &config.forms)?);

        let online = !force_offline && server_reachable(transport.as_ref()).await;
        debug!(online, server = %config.sync.server_url, "initial connectivity");

        let service = OfflineService::new(
            store.clone() as Arc<dyn LocalStore>,
            transport.clone() as Arc<dyn SyncTransport>,
            Arc::new(TracingNotifier) as Arc<dyn Notifier>,
            ConnectivityMonitor::new(online),
            config.forms.clone(),
        );

        Ok(Self {
            config,
            store,
            transport,
            service,
        })
    }

    pub fn is_online(&self) -> bool {
        self.service.monitor().is_online()
    }
}

/// Any answer, even a server error, means the network path works.
async fn server_reachable(transport: &HttpTransport) -> bool {
    matches!(
        transport.health_check().await,
        Ok(HealthStatus::Healthy | HealthStatus::Degraded(_))
    )
}

/// Color is used only on a terminal and without `--plain`.
pub fn use_color(plain: bool) -> bool {
    use std::io::IsTerminal;
    !plain && std::io::stdout().is_terminal()
}
