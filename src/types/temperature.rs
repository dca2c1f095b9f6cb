// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature values and unit preference.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Temperature unit preference of a gateway endpoint.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::types::TemperatureUnit;
///
/// assert_eq!("°F".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Fahrenheit);
/// assert_eq!("celsius".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Celsius);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum TemperatureUnit {
    /// Degrees Celsius (the unit the gateway reports in).
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl TemperatureUnit {
    /// Returns the unit symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TemperatureUnit {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "°c" | "celsius" => Ok(Self::Celsius),
            "f" | "°f" | "fahrenheit" => Ok(Self::Fahrenheit),
            _ => Err(ValueError::InvalidTemperatureUnit(s.to_string())),
        }
    }
}

/// A temperature reading in a known unit.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Temperature {
    value: f32,
    unit: TemperatureUnit,
}

impl Temperature {
    /// Creates a reading from a Celsius value, expressed in `unit`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecowitt_iot::types::{Temperature, TemperatureUnit};
    ///
    /// let t = Temperature::from_celsius(20.0, TemperatureUnit::Fahrenheit);
    /// assert!((t.value() - 68.0).abs() < f32::EPSILON);
    /// ```
    #[must_use]
    pub fn from_celsius(celsius: f32, unit: TemperatureUnit) -> Self {
        let value = match unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        };
        Self { value, unit }
    }

    /// Returns the numeric value in [`unit`](Self::unit).
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Returns the unit of this reading.
    #[must_use]
    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}{}", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_is_unchanged() {
        let t = Temperature::from_celsius(21.5, TemperatureUnit::Celsius);
        assert!((t.value() - 21.5).abs() < f32::EPSILON);
        assert_eq!(t.unit(), TemperatureUnit::Celsius);
    }

    #[test]
    fn freezing_point_in_fahrenheit() {
        let t = Temperature::from_celsius(0.0, TemperatureUnit::Fahrenheit);
        assert!((t.value() - 32.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unit_parse_rejects_garbage() {
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn display() {
        let t = Temperature::from_celsius(20.0, TemperatureUnit::Celsius);
        assert_eq!(t.to_string(), "20.0°C");
    }
}
