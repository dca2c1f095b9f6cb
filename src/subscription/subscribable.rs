// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for sources of gateway events.

use crate::registry::PeripheralRecord;
use crate::state::ReconciledState;
use crate::subscription::SubscriptionId;
use crate::types::PeripheralId;

/// Trait for types that deliver gateway events to callbacks.
///
/// # Examples
///
/// ```no_run
/// use ecowitt_iot::protocol::GatewayConfig;
/// use ecowitt_iot::scheduler::{PollScheduler, SchedulerConfig};
/// use ecowitt_iot::subscription::Subscribable;
///
/// # fn example() -> ecowitt_iot::Result<()> {
/// let client = GatewayConfig::new("192.168.1.50").into_client()?;
/// let scheduler = PollScheduler::new(client, SchedulerConfig::default());
///
/// let sub_id = scheduler.on_state_changed(|id, state| {
///     println!("{id} is now {state}");
/// });
/// scheduler.on_availability_changed(|available| {
///     println!("gateway available: {available}");
/// });
///
/// scheduler.unsubscribe(sub_id);
/// # Ok(())
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to newly discovered peripherals.
    fn on_peripheral_added<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PeripheralRecord) + Send + Sync + 'static;

    /// Subscribes to removed peripherals.
    fn on_peripheral_removed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId) + Send + Sync + 'static;

    /// Subscribes to reconciled state changes.
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId, &ReconciledState) + Send + Sync + 'static;

    /// Subscribes to gateway availability changes.
    ///
    /// Fires once when the gateway is declared unreachable and once when it
    /// answers again, never once per failed poll.
    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to commands that were not confirmed within the activation window.
    fn on_reconciliation_timeout<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
