// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page-side offline machinery for the CSU tracker.
//!
//! - [`ConnectivityMonitor`]: deduplicated online/offline transitions.
//! - [`SyncEngine`]: per-item drain of unsynced entries and queued mutations.
//! - [`FormInterceptor`]: captures opted-in forms while offline.
//! - [`HttpTransport`]: the REST boundary, with CSRF and request timeouts.
//! - [`OfflineService`]: wires the above and owns their lifecycle.

pub mod connectivity;
pub mod csrf;
pub mod engine;
pub mod interceptor;
pub mod notifier;
pub mod service;
pub mod transport;

pub use connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use engine::{SyncEngine, SyncOutcome, SyncReport};
pub use interceptor::{Disposition, FormInterceptor, FormSubmission};
pub use notifier::TracingNotifier;
pub use service::OfflineService;
pub use transport::HttpTransport;
