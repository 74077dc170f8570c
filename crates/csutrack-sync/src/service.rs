// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline service lifecycle.
//!
//! [`OfflineService`] owns the wiring between store, monitor, engine and
//! interceptor. Collaborators are injected at construction; [`init`] opens
//! the store and starts the connectivity listener; [`shutdown`] stops the
//! listener, waits for in-flight drains and closes the store.
//!
//! [`init`]: OfflineService::init
//! [`shutdown`]: OfflineService::shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use csutrack_config::model::FormsConfig;
use csutrack_core::{CsuError, LocalStore, Notifier, SyncTransport};

use crate::connectivity::{ConnectivityEvent, ConnectivityMonitor};
use crate::engine::{SyncEngine, SyncReport};
use crate::interceptor::FormInterceptor;

/// Upper bound on waiting for background drains during shutdown.
const DRAIN_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OfflineService {
    store: Arc<dyn LocalStore>,
    notifier: Arc<dyn Notifier>,
    monitor: ConnectivityMonitor,
    engine: Arc<SyncEngine>,
    interceptor: FormInterceptor,
    cancel: CancellationToken,
    drains: TaskTracker,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl OfflineService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        transport: Arc<dyn SyncTransport>,
        notifier: Arc<dyn Notifier>,
        monitor: ConnectivityMonitor,
        forms: FormsConfig,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            transport.clone(),
            monitor.clone(),
        ));
        let interceptor = FormInterceptor::new(
            store.clone(),
            transport,
            notifier.clone(),
            monitor.clone(),
            forms,
        );
        Self {
            store,
            notifier,
            monitor,
            engine,
            interceptor,
            cancel: CancellationToken::new(),
            drains: TaskTracker::new(),
            listener: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn interceptor(&self) -> &FormInterceptor {
        &self.interceptor
    }

    /// Opens the store, starts listening for connectivity transitions, and
    /// starts a background drain when already online.
    ///
    /// A store open failure is returned as [`CsuError::StoreUnavailable`];
    /// nothing is started and the caller should run online-only.
    pub async fn init(&self) -> Result<(), CsuError> {
        self.store.init().await?;

        let mut listener = self.listener.lock().await;
        if listener.is_none() {
            *listener = Some(self.spawn_listener());
        }
        drop(listener);

        if self.monitor.is_online() {
            spawn_drain(&self.drains, self.engine.clone(), "startup");
        }
        info!(online = self.monitor.is_online(), "offline service started");
        Ok(())
    }

    /// Runs one pass now and waits for it, for explicit retries.
    pub async fn sync_now(&self) -> Result<SyncReport, CsuError> {
        self.engine.sync_pending_items().await
    }

    pub async fn shutdown(&self) -> Result<(), CsuError> {
        self.cancel.cancel();
        if let Some(handle) = self.listener.lock().await.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "connectivity listener ended abnormally");
        }

        self.drains.close();
        if tokio::time::timeout(DRAIN_SHUTDOWN_TIMEOUT, self.drains.wait())
            .await
            .is_err()
        {
            warn!("background sync still running at shutdown; abandoning it");
        }

        self.store.close().await?;
        info!("offline service stopped");
        Ok(())
    }

    fn spawn_listener(&self) -> JoinHandle<()> {
        let mut events = self.monitor.subscribe();
        let cancel = self.cancel.clone();
        let notifier = self.notifier.clone();
        let engine = self.engine.clone();
        let drains = self.drains.clone();
        let monitor = self.monitor.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("connectivity listener stopping");
                        break;
                    }
                    event = events.recv() => {
                        match event {
                            Ok(event) => {
                                notifier.connectivity_changed(event.is_online());
                                if event == ConnectivityEvent::BecameOnline {
                                    spawn_drain(&drains, engine.clone(), "reconnect");
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(missed)) => {
                                warn!(missed, "connectivity events lagged; resyncing from current state");
                                let online = monitor.is_online();
                                notifier.connectivity_changed(online);
                                if online {
                                    spawn_drain(&drains, engine.clone(), "reconnect");
                                }
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        })
    }
}

/// Starts a drain without waiting for it. Its result is logged, never dropped.
fn spawn_drain(drains: &TaskTracker, engine: Arc<SyncEngine>, trigger: &'static str) {
    drains.spawn(async move {
        match engine.sync_pending_items().await {
            Ok(report) => debug!(trigger, ?report, "background sync finished"),
            Err(e) => error!(trigger, error = %e, "background sync failed"),
        }
    });
}
