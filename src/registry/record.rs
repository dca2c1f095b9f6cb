// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The typed record kept for each discovered peripheral.

use chrono::{DateTime, Utc};

use crate::telemetry::{DeviceListing, PeripheralReport};
use crate::types::{DeviceModel, FirmwareVersion, PeripheralId, PeripheralKind};

/// Last-known view of one peripheral.
///
/// Identity is the gateway id; every other field is refreshed from the
/// latest poll that carried data for it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PeripheralRecord {
    id: PeripheralId,
    model: DeviceModel,
    name: String,
    firmware: FirmwareVersion,
    telemetry: PeripheralReport,
    last_seen: DateTime<Utc>,
    missed_polls: u32,
}

impl PeripheralRecord {
    pub(crate) fn new(
        listing: &DeviceListing,
        model: DeviceModel,
        telemetry: PeripheralReport,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: listing.id(),
            model,
            name: listing.display_name(),
            firmware: listing.firmware(),
            telemetry,
            last_seen: seen_at,
            missed_polls: 0,
        }
    }

    /// Refreshes identity details from the device list and marks the record present.
    pub(crate) fn mark_listed(&mut self, listing: &DeviceListing, seen_at: DateTime<Utc>) {
        self.name = listing.display_name();
        self.firmware = listing.firmware();
        self.last_seen = seen_at;
        self.missed_polls = 0;
    }

    pub(crate) fn set_telemetry(&mut self, telemetry: PeripheralReport) {
        self.telemetry = telemetry;
    }

    /// Counts one more poll without this peripheral and returns the new count.
    pub(crate) fn mark_missed(&mut self) -> u32 {
        self.missed_polls = self.missed_polls.saturating_add(1);
        self.missed_polls
    }

    /// Returns the gateway id.
    #[must_use]
    pub fn id(&self) -> PeripheralId {
        self.id
    }

    /// Returns the peripheral kind.
    #[must_use]
    pub fn kind(&self) -> PeripheralKind {
        self.model.kind()
    }

    /// Returns the hardware model.
    #[must_use]
    pub fn model(&self) -> DeviceModel {
        self.model
    }

    /// Returns the nickname, or `Device <HEX id>` if none is set.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the firmware version.
    #[must_use]
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    /// Returns the latest telemetry.
    #[must_use]
    pub fn telemetry(&self) -> &PeripheralReport {
        &self.telemetry
    }

    /// Returns the on/off state in the latest telemetry.
    ///
    /// This is the raw observation; consumers should use the reconciled state.
    #[must_use]
    pub fn observed_on(&self) -> bool {
        self.telemetry.is_on()
    }

    /// Returns when the peripheral was last listed by the gateway.
    #[must_use]
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Returns how many consecutive polls have not listed this peripheral.
    #[must_use]
    pub fn missed_polls(&self) -> u32 {
        self.missed_polls
    }

    /// Returns `true` if the latest poll did not list this peripheral.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.missed_polls > 0
    }
}
