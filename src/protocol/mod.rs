// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for the gateway's local HTTP API.
//!
//! The [`Transport`] trait is the single-shot primitive the rest of the crate
//! is built on: one call fetches a full [`GatewaySnapshot`], another sends a
//! switching command. Retry and backoff live in the scheduler.
//!
//! # Implementations
//!
//! - [`GatewayClient`]: reqwest-backed client (feature `http`, enabled by default)
//!
//! Tests and alternative transports implement [`Transport`] directly.

#[cfg(feature = "http")]
mod http;
mod payload;

#[cfg(feature = "http")]
pub use http::{GatewayClient, GatewayConfig};
pub use payload::{
    GatewayCommand, OK_REPLY, clean_body, parse_command_reply, parse_device_list, parse_read_reply,
};

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::TransportError;
use crate::types::{DeviceModel, PeripheralId, TemperatureUnit};

/// Acknowledgement of a switching command.
///
/// The gateway only confirms receipt; whether the peripheral actually
/// switched is learned from later polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

/// Result of reading the status of one listed peripheral.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The gateway returned a status payload.
    Reported(serde_json::Value),
    /// The gateway answered `200 OK` without data.
    Acknowledged,
    /// The read for this peripheral failed; the rest of the snapshot is unaffected.
    Failed(TransportError),
    /// The entry was not read (unsupported model or unusable identity).
    Skipped,
}

/// One device-list entry together with the outcome of reading its status.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    /// The raw device-list entry.
    pub listing: serde_json::Value,
    /// The status read for this entry.
    pub status: ReadOutcome,
}

impl SnapshotEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(listing: serde_json::Value, status: ReadOutcome) -> Self {
        Self { listing, status }
    }
}

/// Everything learned from the gateway in one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySnapshot {
    /// When the poll was taken. Drives activation-window checks.
    pub taken_at: DateTime<Utc>,
    /// One entry per device-list item, in gateway order.
    pub entries: Vec<SnapshotEntry>,
}

impl GatewaySnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(taken_at: DateTime<Utc>, entries: Vec<SnapshotEntry>) -> Self {
        Self { taken_at, entries }
    }
}

/// A single-shot exchange with one gateway.
///
/// Implementations must put an explicit deadline on every network call.
pub trait Transport: Send + Sync + 'static {
    /// Fetches the device list and the status of every supported peripheral.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` only if the device list itself could not be
    /// obtained; per-peripheral read failures are recorded on the entries.
    fn fetch_status(&self) -> impl Future<Output = Result<GatewaySnapshot, TransportError>> + Send;

    /// Switches a peripheral on or off.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::RejectedCommand` if the gateway refuses the
    /// command, or `TransportError::Unreachable` if it cannot be reached.
    fn send_command(
        &self,
        id: PeripheralId,
        model: DeviceModel,
        on: bool,
    ) -> impl Future<Output = Result<Ack, TransportError>> + Send;

    /// Returns the temperature unit consumers expect.
    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }
}
