// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-visible, non-blocking status indications.

/// Severity of a transient toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
}

/// Surface for cosmetic feedback: toasts and the connectivity indicator.
///
/// Implementations must not block; they are called from inside sync passes
/// and connectivity handlers.
pub trait Notifier: Send + Sync + 'static {
    /// Shows a short-lived message.
    fn toast(&self, message: &str, kind: ToastKind);

    /// Updates the online/offline indicator.
    fn connectivity_changed(&self, online: bool);
}
