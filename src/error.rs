// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ecowitt_iot` library.
//!
//! The hierarchy follows the layers of the crate: [`TransportError`] for the
//! network exchange with the gateway, [`SchemaError`] for a single
//! peripheral payload that does not have the expected shape, and
//! [`ValueError`] for constrained values built from configuration.

use thiserror::Error;

use crate::types::PeripheralId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The exchange with the gateway failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A peripheral payload did not match its declared kind.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A value failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The peripheral is not known to the registry.
    #[error("peripheral {0} not found")]
    PeripheralNotFound(PeripheralId),

    /// The gateway accepted a command, but the peripheral was removed from
    /// the registry before its state could be tracked.
    ///
    /// The command may still take effect on the hardware.
    #[error("peripheral {0} was removed while its command was in flight")]
    PeripheralRemoved(PeripheralId),

    /// The background poll loop is no longer running.
    #[error("scheduler stopped")]
    SchedulerStopped,
}

/// Errors raised by a single exchange with the gateway.
///
/// Variants carry rendered messages rather than source errors so that a
/// failure can be stored on a snapshot entry and compared in tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The gateway could not be reached (connect failure, timeout, HTTP error status).
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway answered with a payload that is not a valid response.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The gateway explicitly refused a command.
    #[error("command rejected: {0}")]
    RejectedCommand(String),

    /// The configured gateway address is invalid.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl TransportError {
    /// Returns `true` if this error means the gateway did not answer at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            Self::MalformedResponse(err.to_string())
        } else if err.is_builder() {
            Self::InvalidAddress(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

/// Errors raised while interpreting the payload of one peripheral.
///
/// A schema error only ever drops the offending peripheral from the current
/// poll; the rest of the snapshot is still processed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field required for the declared kind is missing.
    #[error("peripheral {id}: missing field {field}")]
    MissingField {
        /// The peripheral whose payload is incomplete.
        id: PeripheralId,
        /// The missing field name.
        field: String,
    },

    /// A field is present but cannot be interpreted.
    #[error("peripheral {id}: invalid {field}: {message}")]
    InvalidValue {
        /// The peripheral whose payload is invalid.
        id: PeripheralId,
        /// The offending field name.
        field: String,
        /// Description of the failure.
        message: String,
    },

    /// A device list entry carries no usable `id`/`model` pair.
    #[error("device entry without identity: {0}")]
    MissingIdentity(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A peripheral id could not be parsed.
    #[error("invalid peripheral id: {0}")]
    InvalidPeripheralId(String),

    /// The model number does not correspond to a supported peripheral.
    #[error("unknown model {0}")]
    UnknownModel(u8),

    /// A temperature unit string was not recognised.
    #[error("invalid temperature unit: {0}")]
    InvalidTemperatureUnit(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
