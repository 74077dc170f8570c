// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the offline layer's collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod notifier;
pub mod store;
pub mod transport;

pub use adapter::PluginAdapter;
pub use notifier::{Notifier, ToastKind};
pub use store::LocalStore;
pub use transport::SyncTransport;
