// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling of a gateway and delivery of the results.
//!
//! [`PollScheduler`] owns the [`DeviceRegistry`](crate::registry::DeviceRegistry)
//! and one [`StateReconciler`](crate::state::StateReconciler) per peripheral.
//! Each poll flows `Transport → registry → reconcilers → events`.
//!
//! # Failure handling
//!
//! A failed poll never clears known state. The first failure keeps the normal
//! cadence, later ones back off exponentially (see [`BackoffPolicy`]). After
//! [`SchedulerConfig::unavailable_after`] consecutive unreachable polls a
//! single `AvailabilityChanged { available: false }` is emitted, and a single
//! `available: true` once the gateway answers again.

mod config;
mod poll_scheduler;

pub use config::{BackoffPolicy, SchedulerConfig};
pub use poll_scheduler::{PollScheduler, PollSummary, SchedulerHandle};
