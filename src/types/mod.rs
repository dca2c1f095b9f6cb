// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Ecowitt IoT peripherals.
//!
//! # Types
//!
//! - [`PeripheralId`] - Gateway-assigned identity of a peripheral
//! - [`PeripheralKind`] / [`DeviceModel`] - Water timer or smart plug, and the concrete model
//! - [`TemperatureUnit`] / [`Temperature`] - Canonical temperature representation
//! - [`WarningFlags`] / [`Warning`] - Decoded warning byte
//! - [`FirmwareVersion`] - Version as reported by the device list (`113` → `1.1.3`)
//! - [`BatteryLevel`] / [`SignalLevel`] - Coarse device levels mapped to percentages

mod firmware;
mod level;
mod model;
mod peripheral_id;
mod temperature;
mod warning;

pub use firmware::FirmwareVersion;
pub use level::{BatteryLevel, SignalLevel};
pub use model::{DeviceModel, PeripheralKind};
pub use peripheral_id::PeripheralId;
pub use temperature::{Temperature, TemperatureUnit};
pub use warning::{Warning, WarningFlags};
