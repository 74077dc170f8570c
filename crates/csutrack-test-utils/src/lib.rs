// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for CSU tracker integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a server.
//!
//! # Components
//!
//! - [`MockTransport`] - Scriptable server boundary that records every call
//! - [`MockNotifier`] - Captures toasts and connectivity indications
//! - [`MockFetcher`], [`MockClients`], [`MemoryNotificationSink`] - Worker-side host fakes
//! - [`TestHarness`] - Temp store, monitor, engine and interceptor wired together

pub mod harness;
pub mod mock_notifier;
pub mod mock_transport;
pub mod mock_worker;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_notifier::MockNotifier;
pub use mock_transport::{CallGate, MockTransport, TransportCall};
pub use mock_worker::{ClientCall, MemoryNotificationSink, MockClients, MockFetcher};
