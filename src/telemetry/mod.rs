// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of gateway payloads into typed peripheral data.
//!
//! The gateway answers with loosely-typed JSON: numeric values may arrive as
//! numbers or as strings, and each model uses its own field names. This
//! module turns that into:
//!
//! - [`DeviceListing`]: one entry of the device list (identity, model, firmware, nickname)
//! - [`PeripheralReport`]: the status of one peripheral, typed per kind
//!
//! Unknown fields are ignored so that firmware additions do not break parsing.

mod field;
mod listing;
mod report;

pub use listing::DeviceListing;
pub use report::{CommonTelemetry, PeripheralReport, SmartPlugReport, WaterTimerReport};
