// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Peripheral identifier type.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Identity of a peripheral as assigned by the gateway.
///
/// The gateway numbers each paired peripheral and keeps that number stable
/// across polls, so two records are the same peripheral exactly when their
/// ids are equal, whatever their attributes say.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::types::PeripheralId;
///
/// let id: PeripheralId = "13836".parse().unwrap();
/// assert_eq!(id.value(), 13836);
/// assert_eq!(id.to_hex(), "360C");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PeripheralId(u32);

impl PeripheralId {
    /// Creates an identifier from the gateway's numeric id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns the id as upper-case hexadecimal, the form printed on the device label.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:X}", self.0)
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PeripheralId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| ValueError::InvalidPeripheralId(s.to_string()))
    }
}

impl From<u32> for PeripheralId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
