// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consumer-visible gateway events.

use crate::registry::PeripheralRecord;
use crate::state::ReconciledState;
use crate::types::PeripheralId;

/// Events emitted by the poll scheduler.
///
/// These are the only externally visible outcomes of polling. Suppressed
/// observations and the polling cadence itself never produce an event.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::event::GatewayEvent;
/// use ecowitt_iot::types::PeripheralId;
///
/// let event = GatewayEvent::ReconciliationTimeout { id: PeripheralId::new(7) };
/// assert_eq!(event.peripheral_id(), Some(PeripheralId::new(7)));
///
/// let event = GatewayEvent::AvailabilityChanged { available: false };
/// assert_eq!(event.peripheral_id(), None);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum GatewayEvent {
    /// A peripheral was discovered.
    PeripheralAdded {
        /// The new record.
        record: PeripheralRecord,
    },

    /// A peripheral was dropped after the discovery-loss threshold.
    PeripheralRemoved {
        /// The removed peripheral.
        id: PeripheralId,
    },

    /// The reconciled on/off state or its confidence changed.
    StateChanged {
        /// The peripheral.
        id: PeripheralId,
        /// The new state.
        state: ReconciledState,
    },

    /// The gateway became unreachable, or reachable again.
    AvailabilityChanged {
        /// Whether the gateway is now reachable.
        available: bool,
    },

    /// A command was not confirmed within the activation window.
    ReconciliationTimeout {
        /// The peripheral.
        id: PeripheralId,
    },
}

impl GatewayEvent {
    /// Returns the peripheral this event concerns, if any.
    #[must_use]
    pub fn peripheral_id(&self) -> Option<PeripheralId> {
        match self {
            Self::PeripheralAdded { record } => Some(record.id()),
            Self::PeripheralRemoved { id }
            | Self::StateChanged { id, .. }
            | Self::ReconciliationTimeout { id } => Some(*id),
            Self::AvailabilityChanged { .. } => None,
        }
    }

    /// Returns `true` for peripheral added/removed events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::PeripheralAdded { .. } | Self::PeripheralRemoved { .. }
        )
    }

    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(state: ReconciledState) -> Self {
        Self::StateChanged {
            id: state.id(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::state::Confidence;

    #[test]
    fn state_changed_carries_id() {
        let state = ReconciledState::new(PeripheralId::new(3), true, Confidence::Pending, Utc::now());
        let event = GatewayEvent::state_changed(state);
        assert_eq!(event.peripheral_id(), Some(PeripheralId::new(3)));
        assert!(!event.is_lifecycle());
    }

    #[test]
    fn removed_is_lifecycle() {
        let event = GatewayEvent::PeripheralRemoved {
            id: PeripheralId::new(3),
        };
        assert!(event.is_lifecycle());
    }
}
