// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for gateway events.

use tokio::sync::broadcast;

use super::GatewayEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fans gateway events out to any number of async subscribers.
///
/// A subscriber that falls more than the channel capacity behind loses the
/// oldest events and receives `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::event::{EventBus, GatewayEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(GatewayEvent::AvailabilityChanged { available: false });
/// assert!(matches!(
///     rx.try_recv(),
///     Ok(GatewayEvent::AvailabilityChanged { available: false })
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    /// Creates an event bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates an event bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event. Discarded when nobody listens.
    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
