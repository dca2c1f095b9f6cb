// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of the per-peripheral warning byte.

use super::PeripheralKind;

/// A single warning condition reported by a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Warning {
    /// Plug: leakage current detected.
    LeakCurrent,
    /// Plug: relay closed but nothing draws power.
    NoLoad,
    /// Plug: load current below the expected range.
    LowCurrent,
    /// Plug: load exceeds the rated power.
    Overload,
    /// Plug: the relay does not behave as commanded.
    RelayAbnormal,
    /// Timer: water leak detected.
    Leak,
    /// Timer: valve open but no water flowing.
    NoWater,
    /// Timer: water temperature too low.
    TemperatureLow,
    /// Timer: water temperature too high.
    TemperatureHigh,
    /// Timer: battery is low.
    LowBattery,
    /// The peripheral lost its radio link to the gateway.
    Offline,
}

const PLUG_BITS: [(u8, Warning); 6] = [
    (0, Warning::LeakCurrent),
    (1, Warning::NoLoad),
    (2, Warning::LowCurrent),
    (3, Warning::Overload),
    (4, Warning::RelayAbnormal),
    (7, Warning::Offline),
];

const TIMER_BITS: [(u8, Warning); 6] = [
    (0, Warning::Leak),
    (1, Warning::NoWater),
    (2, Warning::TemperatureLow),
    (3, Warning::TemperatureHigh),
    (4, Warning::LowBattery),
    (7, Warning::Offline),
];

/// The raw warning byte of a peripheral.
///
/// Bit meanings depend on the peripheral kind, so decoding always takes the
/// kind into account.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::types::{PeripheralKind, Warning, WarningFlags};
///
/// let flags = WarningFlags::new(0b1000_0010);
/// assert!(flags.contains(PeripheralKind::WaterTimer, Warning::NoWater));
/// assert!(flags.contains(PeripheralKind::SmartPlug, Warning::NoLoad));
/// assert!(flags.is_offline());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct WarningFlags(u8);

impl WarningFlags {
    /// Wraps a raw warning byte.
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw byte.
    #[must_use]
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the offline bit is set.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        self.0 & (1 << 7) != 0
    }

    /// Returns `true` if `warning` is active for a peripheral of `kind`.
    #[must_use]
    pub fn contains(&self, kind: PeripheralKind, warning: Warning) -> bool {
        Self::table(kind)
            .iter()
            .any(|(bit, w)| *w == warning && self.0 & (1 << bit) != 0)
    }

    /// Returns every active warning for a peripheral of `kind`.
    #[must_use]
    pub fn active(&self, kind: PeripheralKind) -> Vec<Warning> {
        Self::table(kind)
            .iter()
            .filter(|(bit, _)| self.0 & (1 << bit) != 0)
            .map(|(_, w)| *w)
            .collect()
    }

    fn table(kind: PeripheralKind) -> &'static [(u8, Warning); 6] {
        match kind {
            PeripheralKind::SmartPlug => &PLUG_BITS,
            PeripheralKind::WaterTimer => &TIMER_BITS,
        }
    }
}
