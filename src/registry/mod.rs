// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery and tracking of the peripherals behind a gateway.
//!
//! [`DeviceRegistry::reconcile_snapshot`] maps each poll onto a stable set of
//! [`PeripheralRecord`]s keyed by gateway id and reports what was added,
//! updated and removed.

mod device_registry;
mod record;

pub use device_registry::{DeviceRegistry, RegistryDiff};
pub use record::PeripheralRecord;
