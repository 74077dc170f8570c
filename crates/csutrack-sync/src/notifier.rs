// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that writes status indications to the log.

use csutrack_core::{Notifier, ToastKind};
use tracing::{info, warn};

/// Headless [`Notifier`] for the CLI: toasts and indicator changes become
/// log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn toast(&self, message: &str, kind: ToastKind) {
        match kind {
            ToastKind::Warning => warn!(toast = message),
            ToastKind::Info | ToastKind::Success => info!(toast = message, ?kind),
        }
    }

    fn connectivity_changed(&self, online: bool) {
        if online {
            info!("back online");
        } else {
            warn!("offline; changes will be queued until connectivity returns");
        }
    }
}
