// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Peripheral kinds and gateway model numbers.

use std::fmt;

use crate::error::ValueError;

/// The kind of peripheral, independent of the hardware revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PeripheralKind {
    /// A water-timer valve (WFC01, WFC02).
    WaterTimer,
    /// A smart plug with energy metering (AC1100).
    SmartPlug,
}

impl fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaterTimer => f.write_str("water timer"),
            Self::SmartPlug => f.write_str("smart plug"),
        }
    }
}

/// A supported hardware model, as numbered by the gateway.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::types::{DeviceModel, PeripheralKind};
///
/// let model = DeviceModel::from_code(3).unwrap();
/// assert_eq!(model, DeviceModel::Wfc02);
/// assert_eq!(model.kind(), PeripheralKind::WaterTimer);
/// assert!(DeviceModel::from_code(9).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DeviceModel {
    /// WFC01 water timer (model 1).
    Wfc01,
    /// AC1100 smart plug (model 2).
    Ac1100,
    /// WFC02 water timer (model 3).
    Wfc02,
}

impl DeviceModel {
    /// Resolves a gateway model number.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownModel` for models this crate does not handle.
    pub fn from_code(code: u8) -> Result<Self, ValueError> {
        match code {
            1 => Ok(Self::Wfc01),
            2 => Ok(Self::Ac1100),
            3 => Ok(Self::Wfc02),
            other => Err(ValueError::UnknownModel(other)),
        }
    }

    /// Returns the gateway model number.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Wfc01 => 1,
            Self::Ac1100 => 2,
            Self::Wfc02 => 3,
        }
    }

    /// Returns the peripheral kind for this model.
    #[must_use]
    pub const fn kind(&self) -> PeripheralKind {
        match self {
            Self::Wfc01 | Self::Wfc02 => PeripheralKind::WaterTimer,
            Self::Ac1100 => PeripheralKind::SmartPlug,
        }
    }

    /// Returns the marketing name of the model.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Wfc01 => "WFC01",
            Self::Ac1100 => "AC1100",
            Self::Wfc02 => "WFC02",
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_resolve_to_models() {
        for model in [DeviceModel::Wfc01, DeviceModel::Ac1100, DeviceModel::Wfc02] {
            assert_eq!(DeviceModel::from_code(model.code()), Ok(model));
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert_eq!(DeviceModel::from_code(0), Err(ValueError::UnknownModel(0)));
    }

    #[test]
    fn kinds() {
        assert_eq!(DeviceModel::Wfc01.kind(), PeripheralKind::WaterTimer);
        assert_eq!(DeviceModel::Ac1100.kind(), PeripheralKind::SmartPlug);
    }

    #[test]
    fn display_uses_model_name() {
        assert_eq!(DeviceModel::Ac1100.to_string(), "AC1100");
    }
}
