// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker-side half of the CSU tracker: a versioned static-asset cache with
//! a strict interception policy, plus push notification display and click
//! routing.

pub mod cache;
pub mod click;
pub mod controller;
pub mod fetcher;
pub mod platform;
pub mod policy;
pub mod push;
pub mod request;
pub mod worker;

pub use cache::{CacheStorage, MemoryCacheStorage};
pub use click::ClickOutcome;
pub use controller::{CacheController, InstallReport, WorkerState};
pub use fetcher::{Fetcher, HttpFetcher};
pub use platform::{ClientWindow, Clients, NotificationSink};
pub use policy::{RequestClass, classify};
pub use push::{Notification, PushPayload};
pub use request::{FetchRequest, FetchResponse, RequestMode, ResponseType};
pub use worker::ServiceWorker;
