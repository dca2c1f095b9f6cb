// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coarse battery and radio signal levels.

/// Battery level reported by a water timer on a 0-5 scale.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::types::BatteryLevel;
///
/// assert_eq!(BatteryLevel::new(4).percent(), 80);
/// assert_eq!(BatteryLevel::new(9).percent(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    /// Highest level on the device scale.
    pub const MAX: u8 = 5;

    /// Wraps a raw level.
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw level.
    #[must_use]
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// Returns the level as a percentage, or 0 for out-of-scale values.
    #[must_use]
    pub fn percent(&self) -> u8 {
        scale(self.0, Self::MAX)
    }
}

/// RF link quality between peripheral and gateway on a 0-4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SignalLevel(u8);

impl SignalLevel {
    /// Highest level on the device scale.
    pub const MAX: u8 = 4;

    /// Wraps a raw level.
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw level.
    #[must_use]
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// Returns the level as a percentage, or 0 for out-of-scale values.
    #[must_use]
    pub fn percent(&self) -> u8 {
        scale(self.0, Self::MAX)
    }
}

fn scale(raw: u8, max: u8) -> u8 {
    if raw > max {
        return 0;
    }
    // raw <= max, so the quotient is at most 100
    u8::try_from(u16::from(raw) * 100 / u16::from(max)).unwrap_or(0)
}
