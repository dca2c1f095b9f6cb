// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Firmware version as encoded by the gateway.

use std::fmt;

/// Firmware version packed as a decimal number.
///
/// The device list reports `ver: 113` for firmware 1.1.3.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::types::FirmwareVersion;
///
/// assert_eq!(FirmwareVersion::new(105).to_string(), "1.0.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FirmwareVersion(u16);

impl FirmwareVersion {
    /// Wraps a packed version number.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the packed number.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0 / 100, self.0 / 10 % 10, self.0 % 10)
    }
}
