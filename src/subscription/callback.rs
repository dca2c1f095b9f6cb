// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback storage and dispatch.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Stores callbacks and dispatches [`GatewayEvent`]s to them

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::event::GatewayEvent;
use crate::registry::PeripheralRecord;
use crate::state::ReconciledState;
use crate::types::PeripheralId;

/// Unique identifier for a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type AddedCallback = Arc<dyn Fn(&PeripheralRecord) + Send + Sync>;
type RemovedCallback = Arc<dyn Fn(PeripheralId) + Send + Sync>;
type StateChangedCallback = Arc<dyn Fn(PeripheralId, &ReconciledState) + Send + Sync>;
type AvailabilityCallback = Arc<dyn Fn(bool) + Send + Sync>;
type TimeoutCallback = Arc<dyn Fn(PeripheralId) + Send + Sync>;

/// Thread-safe store of consumer callbacks.
///
/// Callbacks run synchronously on the task that dispatches the event, in
/// arbitrary order. They must not block.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    added_callbacks: RwLock<HashMap<SubscriptionId, AddedCallback>>,
    removed_callbacks: RwLock<HashMap<SubscriptionId, RemovedCallback>>,
    state_changed_callbacks: RwLock<HashMap<SubscriptionId, StateChangedCallback>>,
    availability_callbacks: RwLock<HashMap<SubscriptionId, AvailabilityCallback>>,
    timeout_callbacks: RwLock<HashMap<SubscriptionId, TimeoutCallback>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            added_callbacks: RwLock::new(HashMap::new()),
            removed_callbacks: RwLock::new(HashMap::new()),
            state_changed_callbacks: RwLock::new(HashMap::new()),
            availability_callbacks: RwLock::new(HashMap::new()),
            timeout_callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Registration methods
    // =========================================================================

    /// Registers a callback for newly discovered peripherals.
    pub fn on_peripheral_added<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PeripheralRecord) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.added_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for removed peripherals.
    pub fn on_peripheral_removed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.removed_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for reconciled state changes.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId, &ReconciledState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.state_changed_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for gateway availability changes.
    pub fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.availability_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for commands that were not confirmed in time.
    pub fn on_reconciliation_timeout<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.timeout_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    // =========================================================================
    // Unsubscription
    // =========================================================================

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.added_callbacks.write().remove(&id).is_some()
            || self.removed_callbacks.write().remove(&id).is_some()
            || self.state_changed_callbacks.write().remove(&id).is_some()
            || self.availability_callbacks.write().remove(&id).is_some()
            || self.timeout_callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.added_callbacks.write().clear();
        self.removed_callbacks.write().clear();
        self.state_changed_callbacks.write().clear();
        self.availability_callbacks.write().clear();
        self.timeout_callbacks.write().clear();
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Calls every callback registered for the kind of `event`.
    pub fn dispatch(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::PeripheralAdded { record } => {
                for callback in self.added_callbacks.read().values() {
                    callback(record);
                }
            }
            GatewayEvent::PeripheralRemoved { id } => {
                for callback in self.removed_callbacks.read().values() {
                    callback(*id);
                }
            }
            GatewayEvent::StateChanged { id, state } => {
                for callback in self.state_changed_callbacks.read().values() {
                    callback(*id, state);
                }
            }
            GatewayEvent::AvailabilityChanged { available } => {
                for callback in self.availability_callbacks.read().values() {
                    callback(*available);
                }
            }
            GatewayEvent::ReconciliationTimeout { id } => {
                for callback in self.timeout_callbacks.read().values() {
                    callback(*id);
                }
            }
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.added_callbacks.read().len()
            + self.removed_callbacks.read().len()
            + self.state_changed_callbacks.read().len()
            + self.availability_callbacks.read().len()
            + self.timeout_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use chrono::Utc;

    use super::*;
    use crate::state::Confidence;

    #[test]
    fn subscription_id_display() {
        assert_eq!(SubscriptionId::new(42).to_string(), "Sub(42)");
    }

    #[test]
    fn ids_are_unique() {
        let registry = CallbackRegistry::new();
        let a = registry.on_availability_changed(|_| {});
        let b = registry.on_availability_changed(|_| {});
        assert_ne!(a, b);
        assert_eq!(registry.callback_count(), 2);
    }

    #[test]
    fn availability_dispatch_and_unsubscribe() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let id = registry.on_availability_changed(move |available| {
            assert!(!available);
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&GatewayEvent::AvailabilityChanged { available: false });
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert!(registry.is_empty());

        registry.dispatch(&GatewayEvent::AvailabilityChanged { available: false });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn state_changed_receives_state() {
        let registry = CallbackRegistry::new();
        let received = Arc::new(RwLock::new(None));
        let received_clone = Arc::clone(&received);

        registry.on_state_changed(move |id, state| {
            *received_clone.write() = Some((id, *state));
        });

        let state = ReconciledState::new(PeripheralId::new(7), true, Confidence::Pending, Utc::now());
        registry.dispatch(&GatewayEvent::state_changed(state));

        assert_eq!(*received.read(), Some((PeripheralId::new(7), state)));
    }

    #[test]
    fn dispatch_only_reaches_matching_kind() {
        let registry = CallbackRegistry::new();
        let timeouts = Arc::new(AtomicU32::new(0));
        let removals = Arc::new(AtomicU32::new(0));

        let t = Arc::clone(&timeouts);
        registry.on_reconciliation_timeout(move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        });
        let r = Arc::clone(&removals);
        registry.on_peripheral_removed(move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&GatewayEvent::ReconciliationTimeout {
            id: PeripheralId::new(7),
        });

        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
        assert_eq!(removals.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_removes_everything() {
        let registry = CallbackRegistry::new();
        registry.on_peripheral_added(|_| {});
        registry.on_peripheral_removed(|_| {});
        registry.clear();
        assert!(registry.is_empty());
    }
}
