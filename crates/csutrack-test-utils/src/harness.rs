// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end offline scenarios.
//!
//! `TestHarness` assembles a temp SQLite store, a connectivity monitor, a
//! mock transport and notifier, plus the sync engine and form interceptor
//! over them. Connectivity changes made through the harness are not acted on
//! by any listener, so tests drive sync passes explicitly; use
//! [`TestHarness::service`] for the event-driven lifecycle.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use csutrack_config::model::{FormsConfig, StorageConfig};
use csutrack_core::{CsuError, HttpMethod, LocalStore, Notifier, SyncTransport};
use csutrack_storage::{RetryPolicy, SqliteStore};
use csutrack_sync::{
    ConnectivityMonitor, Disposition, FormInterceptor, FormSubmission, OfflineService, SyncEngine,
    SyncReport,
};

use crate::mock_notifier::MockNotifier;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    online: bool,
    policy: RetryPolicy,
    forms: FormsConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            online: true,
            policy: RetryPolicy::default(),
            forms: FormsConfig::default(),
        }
    }

    /// Start offline instead of online.
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Evicted items are discarded instead of dead-lettered.
    pub fn without_dead_letters(mut self) -> Self {
        self.policy.dead_letter = false;
        self
    }

    pub fn with_forms(mut self, forms: FormsConfig) -> Self {
        self.forms = forms;
        self
    }

    /// Build the test harness, opening the temp store.
    pub async fn build(self) -> Result<TestHarness, CsuError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| CsuError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("offline.db");

        let store = Arc::new(SqliteStore::new(
            StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                wal_mode: true,
            },
            self.policy,
        ));
        store.init().await?;

        let monitor = ConnectivityMonitor::new(self.online);
        let transport = Arc::new(MockTransport::new());
        let notifier = Arc::new(MockNotifier::new());

        let engine = SyncEngine::new(
            store.clone() as Arc<dyn LocalStore>,
            transport.clone() as Arc<dyn SyncTransport>,
            monitor.clone(),
        );
        let interceptor = FormInterceptor::new(
            store.clone() as Arc<dyn LocalStore>,
            transport.clone() as Arc<dyn SyncTransport>,
            notifier.clone() as Arc<dyn Notifier>,
            monitor.clone(),
            self.forms.clone(),
        );

        Ok(TestHarness {
            store,
            monitor,
            transport,
            notifier,
            engine,
            interceptor,
            forms: self.forms,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete offline-layer test environment over a temp database.
pub struct TestHarness {
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    pub monitor: ConnectivityMonitor,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<MockNotifier>,
    pub engine: SyncEngine,
    pub interceptor: FormInterceptor,
    forms: FormsConfig,
    db_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Online harness with default retry policy.
    pub async fn new() -> Result<Self, CsuError> {
        Self::builder().build().await
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    pub fn go_online(&self) {
        self.monitor.report(true);
    }

    pub fn go_offline(&self) {
        self.monitor.report(false);
    }

    /// Runs one sync pass on the harness engine.
    pub async fn sync(&self) -> Result<SyncReport, CsuError> {
        self.engine.sync_pending_items().await
    }

    /// Submits an offline-capable daily log form for `date`.
    pub async fn submit_log(
        &self,
        date: NaiveDate,
        itch: u8,
        hive: u8,
    ) -> Result<Disposition, CsuError> {
        let submission = FormSubmission::new(self.forms.log_path_marker.clone(), HttpMethod::Post)
            .field(self.forms.csrf_field.clone(), "test-csrf-token")
            .field("date", date.format("%Y-%m-%d").to_string())
            .field("itch_score", itch.to_string())
            .field("hive_count_score", hive.to_string());
        self.interceptor.handle(&submission, date).await
    }

    /// A lifecycle-managed service sharing this harness's store, monitor,
    /// transport and notifier. Not yet initialized.
    pub fn service(&self) -> OfflineService {
        OfflineService::new(
            self.store.clone() as Arc<dyn LocalStore>,
            self.transport.clone() as Arc<dyn SyncTransport>,
            self.notifier.clone() as Arc<dyn Notifier>,
            self.monitor.clone(),
            self.forms.clone(),
        )
    }
}
