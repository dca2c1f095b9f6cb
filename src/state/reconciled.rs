// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consumer-facing state and command intents.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::PeripheralId;

/// How much the reconciled value can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The value matches what the hardware reports.
    Confirmed,
    /// The value is what was commanded; the hardware has not caught up yet.
    Pending,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => f.write_str("confirmed"),
            Self::Pending => f.write_str("pending"),
        }
    }
}

/// The single authoritative on/off state of a peripheral.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use ecowitt_iot::state::{Confidence, ReconciledState};
/// use ecowitt_iot::types::PeripheralId;
///
/// let state = ReconciledState::new(PeripheralId::new(7), true, Confidence::Pending, Utc::now());
/// assert!(state.is_on());
/// assert!(state.is_pending());
/// assert_eq!(state.to_string(), "on/pending");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReconciledState {
    id: PeripheralId,
    is_on: bool,
    confidence: Confidence,
    last_transition: DateTime<Utc>,
}

impl ReconciledState {
    /// Creates a state value.
    #[must_use]
    pub fn new(
        id: PeripheralId,
        is_on: bool,
        confidence: Confidence,
        last_transition: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            is_on,
            confidence,
            last_transition,
        }
    }

    /// Returns the peripheral id.
    #[must_use]
    pub fn id(&self) -> PeripheralId {
        self.id
    }

    /// Returns the authoritative on/off value.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns the confidence tag.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Returns `true` while a command awaits confirmation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.confidence == Confidence::Pending
    }

    /// Returns when the value or confidence last changed.
    #[must_use]
    pub fn last_transition(&self) -> DateTime<Utc> {
        self.last_transition
    }

    /// Returns `true` if `other` differs in value or confidence.
    pub(crate) fn differs_from(&self, is_on: bool, confidence: Confidence) -> bool {
        self.is_on != is_on || self.confidence != confidence
    }
}

impl fmt::Display for ReconciledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.is_on { "on" } else { "off" };
        write!(f, "{value}/{}", self.confidence)
    }
}

/// A requested state change awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandIntent {
    /// The peripheral the command targets.
    pub id: PeripheralId,
    /// The requested on/off value.
    pub desired: bool,
    /// When the gateway acknowledged the command.
    pub issued_at: DateTime<Utc>,
}
