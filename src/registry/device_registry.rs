// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of discovered peripherals.

use std::collections::{HashMap, HashSet};

use crate::error::SchemaError;
use crate::protocol::{GatewaySnapshot, ReadOutcome};
use crate::telemetry::{DeviceListing, PeripheralReport};
use crate::types::{PeripheralId, TemperatureUnit};

use super::record::PeripheralRecord;

/// Changes produced by applying one snapshot to the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryDiff {
    /// Peripherals seen with data for the first time.
    pub added: Vec<PeripheralRecord>,
    /// Known peripherals refreshed with new data.
    pub updated: Vec<PeripheralRecord>,
    /// Peripherals dropped after the discovery-loss threshold.
    pub removed: Vec<PeripheralId>,
    /// Known peripherals listed in the snapshot without fresh data.
    pub unobserved: Vec<PeripheralId>,
    /// Per-peripheral payload problems; each dropped only that peripheral.
    pub errors: Vec<SchemaError>,
}

/// The set of peripherals behind one gateway.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use ecowitt_iot::protocol::{GatewaySnapshot, ReadOutcome, SnapshotEntry};
/// use ecowitt_iot::registry::DeviceRegistry;
/// use ecowitt_iot::types::TemperatureUnit;
/// use serde_json::json;
///
/// let mut registry = DeviceRegistry::new(TemperatureUnit::Celsius, 3);
/// let snapshot = GatewaySnapshot::new(
///     Utc::now(),
///     vec![SnapshotEntry::new(
///         json!({"id": 7, "model": 2}),
///         ReadOutcome::Reported(json!({"ac_status": 1})),
///     )],
/// );
///
/// let diff = registry.reconcile_snapshot(&snapshot);
/// assert_eq!(diff.added.len(), 1);
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    records: HashMap<PeripheralId, PeripheralRecord>,
    unit: TemperatureUnit,
    loss_threshold: u32,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    ///
    /// `loss_threshold` is the number of consecutive polls a peripheral may
    /// be missing before it is removed; values below 1 are treated as 1.
    #[must_use]
    pub fn new(unit: TemperatureUnit, loss_threshold: u32) -> Self {
        Self {
            records: HashMap::new(),
            unit,
            loss_threshold: loss_threshold.max(1),
        }
    }

    /// Returns the record for `id`.
    #[must_use]
    pub fn get(&self, id: PeripheralId) -> Option<&PeripheralRecord> {
        self.records.get(&id)
    }

    /// Returns `true` if `id` is known.
    #[must_use]
    pub fn contains(&self, id: PeripheralId) -> bool {
        self.records.contains_key(&id)
    }

    /// Returns all records, ordered by id.
    #[must_use]
    pub fn records(&self) -> Vec<PeripheralRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by_key(PeripheralRecord::id);
        records
    }

    /// Returns the number of known peripherals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no peripheral is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Applies a snapshot and returns what changed.
    ///
    /// Unsupported models are ignored. A payload that does not match its
    /// model only drops that peripheral from this poll's results.
    pub fn reconcile_snapshot(&mut self, snapshot: &GatewaySnapshot) -> RegistryDiff {
        let mut diff = RegistryDiff::default();
        let mut listed = HashSet::new();

        for entry in &snapshot.entries {
            let listing = match DeviceListing::from_value(&entry.listing) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping device list entry");
                    diff.errors.push(e);
                    continue;
                }
            };
            let id = listing.id();
            let Ok(model) = listing.model() else {
                tracing::debug!(
                    peripheral_id = %id,
                    model = listing.model_code(),
                    "Ignoring unsupported model"
                );
                continue;
            };
            if !listed.insert(id) {
                tracing::debug!(peripheral_id = %id, "Ignoring duplicate device list entry");
                continue;
            }

            let report = match &entry.status {
                ReadOutcome::Reported(payload) => {
                    match PeripheralReport::parse(id, model, payload, self.unit) {
                        Ok(report) => Some(report),
                        Err(e) => {
                            tracing::warn!(peripheral_id = %id, error = %e, "Invalid status payload");
                            diff.errors.push(e);
                            None
                        }
                    }
                }
                ReadOutcome::Acknowledged | ReadOutcome::Failed(_) | ReadOutcome::Skipped => None,
            };

            match (self.records.get_mut(&id), report) {
                (Some(record), Some(report)) => {
                    record.mark_listed(&listing, snapshot.taken_at);
                    record.set_telemetry(report);
                    diff.updated.push(record.clone());
                }
                (Some(record), None) => {
                    record.mark_listed(&listing, snapshot.taken_at);
                    diff.unobserved.push(id);
                }
                (None, Some(report)) => {
                    let record = PeripheralRecord::new(&listing, model, report, snapshot.taken_at);
                    tracing::info!(
                        peripheral_id = %id,
                        model = %model,
                        name = record.name(),
                        "Peripheral discovered"
                    );
                    diff.added.push(record.clone());
                    self.records.insert(id, record);
                }
                (None, None) => {}
            }
        }

        for (id, record) in &mut self.records {
            if !listed.contains(id) {
                let missed = record.mark_missed();
                tracing::debug!(peripheral_id = %id, missed, "Peripheral missing from device list");
                if missed >= self.loss_threshold {
                    diff.removed.push(*id);
                }
            }
        }
        diff.removed.sort();
        for id in &diff.removed {
            self.records.remove(id);
            tracing::info!(peripheral_id = %id, "Peripheral removed");
        }

        diff
    }
}
