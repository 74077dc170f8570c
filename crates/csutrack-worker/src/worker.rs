// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The worker execution context: cache controller plus push handling.

use std::sync::Arc;

use tracing::debug;

use csutrack_config::model::{PushConfig, WorkerConfig};
use csutrack_core::CsuError;

use crate::cache::CacheStorage;
use crate::click::{ClickOutcome, handle_click};
use crate::controller::CacheController;
use crate::fetcher::Fetcher;
use crate::platform::{Clients, NotificationSink};
use crate::push::{Notification, PushPayload};

pub struct ServiceWorker {
    controller: CacheController,
    clients: Arc<dyn Clients>,
    notifications: Arc<dyn NotificationSink>,
    origin: String,
    push: PushConfig,
}

impl ServiceWorker {
    pub fn new(
        worker: WorkerConfig,
        push: PushConfig,
        cache: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<dyn Clients>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        let origin = worker.origin.clone();
        Self {
            controller: CacheController::new(worker, cache, fetcher, Arc::clone(&clients)),
            clients,
            notifications,
            origin,
            push,
        }
    }

    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    /// Renders and shows a notification for a push message.
    pub fn on_push(&self, raw: Option<&[u8]>) -> Notification {
        let notification = Notification::from_push(PushPayload::parse(raw), &self.push);
        debug!(tag = %notification.tag, title = %notification.title, "showing push notification");
        self.notifications.show(&notification);
        notification
    }

    pub async fn on_notification_click(
        &self,
        notification: &Notification,
        action: Option<&str>,
    ) -> Result<ClickOutcome, CsuError> {
        handle_click(
            notification,
            action,
            &self.origin,
            &self.push,
            self.clients.as_ref(),
            self.notifications.as_ref(),
        )
        .await
    }
}
