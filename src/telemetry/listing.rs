// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for entries of the gateway device list.

use serde::Deserialize;

use super::field::FieldValue;
use crate::error::{SchemaError, ValueError};
use crate::types::{DeviceModel, FirmwareVersion, PeripheralId};

#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(default)]
    id: Option<FieldValue>,
    #[serde(default)]
    model: Option<FieldValue>,
    #[serde(default)]
    ver: Option<FieldValue>,
    #[serde(default)]
    nickname: Option<String>,
}

/// One entry of `GET /get_iot_device_list`.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::telemetry::DeviceListing;
/// use ecowitt_iot::types::DeviceModel;
///
/// let value = serde_json::json!({"id": 13836, "model": 1, "ver": 113, "nickname": ""});
/// let listing = DeviceListing::from_value(&value).unwrap();
/// assert_eq!(listing.model(), Ok(DeviceModel::Wfc01));
/// assert_eq!(listing.display_name(), "Device 360C");
/// assert_eq!(listing.firmware().to_string(), "1.1.3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceListing {
    id: PeripheralId,
    model_code: u8,
    firmware: FirmwareVersion,
    nickname: Option<String>,
}

impl DeviceListing {
    /// Parses a raw list entry.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::MissingIdentity` if the entry has no usable
    /// `id`/`model` pair.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SchemaError> {
        let missing = || SchemaError::MissingIdentity(value.to_string());

        let raw = RawListing::deserialize(value).map_err(|_| missing())?;

        let id = raw
            .id
            .as_ref()
            .and_then(FieldValue::as_i64)
            .and_then(|n| u32::try_from(n).ok())
            .map(PeripheralId::new)
            .ok_or_else(missing)?;
        let model_code = raw
            .model
            .as_ref()
            .and_then(FieldValue::as_i64)
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(missing)?;
        let firmware = raw
            .ver
            .as_ref()
            .and_then(FieldValue::as_i64)
            .and_then(|n| u16::try_from(n).ok())
            .map(FirmwareVersion::new)
            .unwrap_or_default();
        let nickname = raw
            .nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            id,
            model_code,
            firmware,
            nickname,
        })
    }

    /// Returns the peripheral id.
    #[must_use]
    pub fn id(&self) -> PeripheralId {
        self.id
    }

    /// Returns the raw gateway model number.
    #[must_use]
    pub fn model_code(&self) -> u8 {
        self.model_code
    }

    /// Resolves the model.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownModel` for unsupported hardware.
    pub fn model(&self) -> Result<DeviceModel, ValueError> {
        DeviceModel::from_code(self.model_code)
    }

    /// Returns the firmware version (`0.0.0` when not reported).
    #[must_use]
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    /// Returns the user-assigned nickname, if any.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Returns the nickname, or `Device <HEX id>` when none is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.nickname
            .clone()
            .unwrap_or_else(|| format!("Device {}", self.id.to_hex()))
    }
}
