// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for `read_device` status payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::field::{FieldReader, FieldValue};
use crate::error::SchemaError;
use crate::types::{
    BatteryLevel, DeviceModel, PeripheralId, PeripheralKind, SignalLevel, Temperature,
    TemperatureUnit, WarningFlags,
};

// ============================================================================
// Raw payload
// ============================================================================

/// Every field either kind may carry. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReport {
    // water timer
    water_status: Option<FieldValue>,
    water_running: Option<FieldValue>,
    always_on: Option<FieldValue>,
    flow_velocity: Option<FieldValue>,
    wfc02_flow_velocity: Option<FieldValue>,
    water_total: Option<FieldValue>,
    wfc02_total: Option<FieldValue>,
    happen_water: Option<FieldValue>,
    run_time: Option<FieldValue>,
    wfc02_position: Option<FieldValue>,
    water_temp: Option<FieldValue>,
    wfc01batt: Option<FieldValue>,
    wfc02batt: Option<FieldValue>,
    wfc02rssi: Option<FieldValue>,

    // smart plug
    ac_status: Option<FieldValue>,
    realtime_power: Option<FieldValue>,
    ac_voltage: Option<FieldValue>,
    ac_current: Option<FieldValue>,
    elect_total: Option<FieldValue>,

    // common
    warning: Option<FieldValue>,
    rssi: Option<FieldValue>,
    gw_rssi: Option<FieldValue>,
    timeutc: Option<FieldValue>,
}

// ============================================================================
// Typed reports
// ============================================================================

/// Fields shared by every peripheral kind.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct CommonTelemetry {
    /// Decoded warning byte.
    pub warnings: WarningFlags,
    /// RF link quality between the peripheral and the gateway.
    pub signal: Option<SignalLevel>,
    /// Gateway-side RSSI in dBm.
    pub gateway_rssi: Option<i16>,
    /// Time of the peripheral's last report to the gateway.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Status of a water timer (WFC01, WFC02).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WaterTimerReport {
    /// Whether water is flowing or the valve is commanded open.
    pub is_on: bool,
    /// Whether the valve is in always-on mode.
    pub always_on: Option<bool>,
    /// Flow rate in L/min.
    pub flow_rate: Option<f64>,
    /// Total water in litres.
    pub total_water: Option<f64>,
    /// Water used by the current run in litres.
    pub run_water: Option<f64>,
    /// Duration of the current run in seconds.
    pub run_time: Option<u32>,
    /// Valve opening in percent.
    pub valve_position: Option<u8>,
    /// Water temperature, in the configured unit.
    pub water_temperature: Option<Temperature>,
    /// Battery level.
    pub battery: Option<BatteryLevel>,
    /// Fields common to all peripherals.
    pub common: CommonTelemetry,
}

/// Status of an AC1100 smart plug.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SmartPlugReport {
    /// Whether the relay is closed.
    pub is_on: bool,
    /// Instantaneous power in W.
    pub power: Option<f64>,
    /// Mains voltage in V.
    pub voltage: Option<f64>,
    /// Load current in A.
    pub current: Option<f64>,
    /// Accumulated energy in Wh.
    pub energy_total: Option<f64>,
    /// Fields common to all peripherals.
    pub common: CommonTelemetry,
}

/// A parsed status payload for one peripheral.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::telemetry::PeripheralReport;
/// use ecowitt_iot::types::{DeviceModel, PeripheralId, TemperatureUnit};
///
/// let payload = serde_json::json!({
///     "water_status": 0, "water_running": 1, "flow_velocity": "3.50", "warning": 0
/// });
/// let report = PeripheralReport::parse(
///     PeripheralId::new(7),
///     DeviceModel::Wfc01,
///     &payload,
///     TemperatureUnit::Celsius,
/// )
/// .unwrap();
/// assert!(report.is_on());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum PeripheralReport {
    /// A water timer status.
    WaterTimer(WaterTimerReport),
    /// A smart plug status.
    SmartPlug(SmartPlugReport),
}

impl PeripheralReport {
    /// Parses the status payload of `id`, interpreting fields for `model`.
    ///
    /// Temperatures are converted from the gateway's Celsius to `unit`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::MissingField` if the on/off field for the kind is
    /// absent, or `SchemaError::InvalidValue` if that field cannot be
    /// interpreted or the payload is not an object. Optional telemetry that
    /// cannot be interpreted is read as absent.
    pub fn parse(
        id: PeripheralId,
        model: DeviceModel,
        payload: &serde_json::Value,
        unit: TemperatureUnit,
    ) -> Result<Self, SchemaError> {
        let raw = RawReport::deserialize(payload).map_err(|e| SchemaError::InvalidValue {
            id,
            field: "payload".to_string(),
            message: e.to_string(),
        })?;
        let reader = FieldReader::new(id);

        match model.kind() {
            PeripheralKind::WaterTimer => parse_water_timer(&reader, &raw, model, unit),
            PeripheralKind::SmartPlug => parse_smart_plug(&reader, &raw),
        }
    }

    /// Returns the reported on/off state.
    #[must_use]
    pub fn is_on(&self) -> bool {
        match self {
            Self::WaterTimer(r) => r.is_on,
            Self::SmartPlug(r) => r.is_on,
        }
    }

    /// Returns the fields shared by every kind.
    #[must_use]
    pub fn common(&self) -> &CommonTelemetry {
        match self {
            Self::WaterTimer(r) => &r.common,
            Self::SmartPlug(r) => &r.common,
        }
    }

    /// Returns the peripheral kind of this report.
    #[must_use]
    pub fn kind(&self) -> PeripheralKind {
        match self {
            Self::WaterTimer(_) => PeripheralKind::WaterTimer,
            Self::SmartPlug(_) => PeripheralKind::SmartPlug,
        }
    }
}

fn parse_common(
    reader: &FieldReader,
    raw: &RawReport,
    rssi_field: (&str, Option<&FieldValue>),
) -> CommonTelemetry {
    let warnings = reader
        .integer::<u8>("warning", raw.warning.as_ref())
        .map(WarningFlags::new)
        .unwrap_or_default();
    let signal = reader
        .integer::<u8>(rssi_field.0, rssi_field.1)
        .map(SignalLevel::new);
    let gateway_rssi = reader.integer::<i16>("gw_rssi", raw.gw_rssi.as_ref());
    let updated_at = reader
        .integer::<i64>("timeutc", raw.timeutc.as_ref())
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    CommonTelemetry {
        warnings,
        signal,
        gateway_rssi,
        updated_at,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_water_timer(
    reader: &FieldReader,
    raw: &RawReport,
    model: DeviceModel,
    unit: TemperatureUnit,
) -> Result<PeripheralReport, SchemaError> {
    let status = reader.required_flag("water_status", raw.water_status.as_ref())?;
    let running = reader.required_flag("water_running", raw.water_running.as_ref())?;
    let is_on = reader.require(
        &["water_status", "water_running"],
        match (status, running) {
            (None, None) => None,
            (s, r) => Some(s.unwrap_or(false) || r.unwrap_or(false)),
        },
    )?;

    let (battery_field, rssi_field) = match model {
        DeviceModel::Wfc02 => (
            ("wfc02batt", raw.wfc02batt.as_ref()),
            ("wfc02rssi", raw.wfc02rssi.as_ref().or(raw.rssi.as_ref())),
        ),
        _ => (
            ("wfc01batt", raw.wfc01batt.as_ref()),
            ("rssi", raw.rssi.as_ref()),
        ),
    };

    let flow_rate = match raw.wfc02_flow_velocity.as_ref() {
        Some(v) => reader.float("wfc02_flow_velocity", Some(v)),
        None => reader.float("flow_velocity", raw.flow_velocity.as_ref()),
    };
    let total_water = match raw.wfc02_total.as_ref() {
        Some(v) => reader.float("wfc02_total", Some(v)),
        None => reader.float("water_total", raw.water_total.as_ref()),
    };
    let water_temperature = reader
        .float("water_temp", raw.water_temp.as_ref())
        .map(|c| Temperature::from_celsius(c as f32, unit));

    Ok(PeripheralReport::WaterTimer(WaterTimerReport {
        is_on,
        always_on: reader.flag("always_on", raw.always_on.as_ref()),
        flow_rate,
        total_water,
        run_water: reader.float("happen_water", raw.happen_water.as_ref()),
        run_time: reader.integer("run_time", raw.run_time.as_ref()),
        valve_position: reader.integer("wfc02_position", raw.wfc02_position.as_ref()),
        water_temperature,
        battery: reader
            .integer::<u8>(battery_field.0, battery_field.1)
            .map(BatteryLevel::new),
        common: parse_common(reader, raw, rssi_field),
    }))
}

fn parse_smart_plug(reader: &FieldReader, raw: &RawReport) -> Result<PeripheralReport, SchemaError> {
    let is_on = reader.require(
        &["ac_status"],
        reader.required_flag("ac_status", raw.ac_status.as_ref())?,
    )?;

    Ok(PeripheralReport::SmartPlug(SmartPlugReport {
        is_on,
        power: reader.float("realtime_power", raw.realtime_power.as_ref()),
        voltage: reader.float("ac_voltage", raw.ac_voltage.as_ref()),
        current: reader.float("ac_current", raw.ac_current.as_ref()),
        energy_total: reader.float("elect_total", raw.elect_total.as_ref()),
        common: parse_common(reader, raw, ("rssi", raw.rssi.as_ref())),
    }))
}
