// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host capabilities the worker drives: open windows and OS notifications.

use async_trait::async_trait;
use csutrack_core::CsuError;

use crate::push::Notification;

/// An open window controlled by (or visible to) the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
    pub focused: bool,
}

#[async_trait]
pub trait Clients: Send + Sync + 'static {
    /// Every window, including ones not yet controlled.
    async fn match_all(&self) -> Result<Vec<ClientWindow>, CsuError>;

    async fn navigate(&self, id: &str, url: &str) -> Result<(), CsuError>;

    async fn focus(&self, id: &str) -> Result<(), CsuError>;

    /// Opens a new window and returns its id.
    async fn open_window(&self, url: &str) -> Result<String, CsuError>;

    /// Takes control of every open page.
    async fn claim(&self) -> Result<(), CsuError>;
}

pub trait NotificationSink: Send + Sync + 'static {
    fn show(&self, notification: &Notification);

    /// Closes the notification carrying `tag`.
    fn close(&self, tag: &str);
}
