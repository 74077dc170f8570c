// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that captures status indications for assertions.

use std::sync::Mutex;

use csutrack_core::{Notifier, ToastKind};

#[derive(Default)]
pub struct MockNotifier {
    toasts: Mutex<Vec<(String, ToastKind)>>,
    connectivity: Mutex<Vec<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<(String, ToastKind)> {
        self.toasts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Indicator changes in the order they were shown.
    pub fn connectivity_changes(&self) -> Vec<bool> {
        self.connectivity
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl Notifier for MockNotifier {
    fn toast(&self, message: &str, kind: ToastKind) {
        self.toasts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((message.to_string(), kind));
    }

    fn connectivity_changed(&self, online: bool) {
        self.connectivity
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(online);
    }
}
