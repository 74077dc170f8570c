// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single source of truth for online/offline state.
//!
//! The platform's connectivity signal is fed in through
//! [`ConnectivityMonitor::report`]. Repeated identical signals are absorbed;
//! subscribers see exactly one event per genuine transition.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

/// Buffer for transition events. Transitions are rare, so a small buffer
/// only lags under pathological flapping.
const EVENT_CAPACITY: usize = 16;

/// A genuine connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
}

impl ConnectivityEvent {
    pub fn is_online(self) -> bool {
        matches!(self, Self::BecameOnline)
    }
}

/// Event-driven connectivity state. Cloning shares the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<bool>>,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(state),
            events,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Feeds one native connectivity signal.
    ///
    /// Returns the emitted event, or `None` when the signal matched the
    /// current state.
    pub fn report(&self, online: bool) -> Option<ConnectivityEvent> {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if !changed {
            debug!(online, "duplicate connectivity signal ignored");
            return None;
        }

        let event = if online {
            ConnectivityEvent::BecameOnline
        } else {
            ConnectivityEvent::BecameOffline
        };
        info!(?event, "connectivity changed");
        // No subscribers is fine: the state itself is still updated.
        let _ = self.events.send(event);
        Some(event)
    }

    /// Receives every transition reported after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Watches the current state rather than transitions.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
