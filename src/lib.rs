// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `EcowittIoT` - A Rust library to poll an Ecowitt gateway and its IoT peripherals.
//!
//! An Ecowitt gateway exposes a small local HTTP API. This library polls it,
//! keeps a registry of the peripherals behind it, and reconciles their on/off
//! state with the commands you send.
//!
//! # Supported Peripherals
//!
//! - WFC01 and WFC02 water timers: valve state, flow, water totals, battery
//! - AC1100 smart plugs: relay state, power, voltage, current, energy
//!
//! # State Reconciliation
//!
//! Gateways report stale state for a few seconds after a command. Each
//! peripheral therefore has a reconciled state carrying a
//! [`Confidence`](state::Confidence): right after an acknowledged command it
//! is the commanded value with `pending` confidence, and contradicting reports
//! are ignored for the activation window. A matching report confirms it; if
//! none arrives in time the observed value wins and a
//! [`GatewayEvent::ReconciliationTimeout`] is emitted.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use ecowitt_iot::{GatewayConfig, GatewayEvent, PollScheduler, SchedulerConfig};
//!
//! #[tokio::main]
//! async fn main() -> ecowitt_iot::Result<()> {
//!     let client = GatewayConfig::new("192.168.1.50").into_client()?;
//!     let config = SchedulerConfig::new().with_poll_interval(Duration::from_secs(15));
//!
//!     let scheduler = PollScheduler::new(client, config);
//!     let mut events = scheduler.subscribe();
//!     let handle = scheduler.spawn();
//!
//!     while let Ok(event) = events.recv().await {
//!         if let GatewayEvent::PeripheralAdded { record } = &event {
//!             println!("found {} ({})", record.name(), record.model());
//!             scheduler.issue_command(record.id(), true).await?;
//!         }
//!     }
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Callbacks
//!
//! ```no_run
//! use ecowitt_iot::{GatewayConfig, PollScheduler, SchedulerConfig, Subscribable};
//!
//! # async fn example() -> ecowitt_iot::Result<()> {
//! let client = GatewayConfig::new("192.168.1.50").into_client()?;
//! let scheduler = PollScheduler::new(client, SchedulerConfig::default());
//!
//! scheduler.on_reconciliation_timeout(|id| {
//!     println!("{id} did not follow its last command");
//! });
//!
//! scheduler.poll_now().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod protocol;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod subscription;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result, SchemaError, TransportError, ValueError};
pub use event::{EventBus, GatewayEvent};
#[cfg(feature = "http")]
pub use protocol::{GatewayClient, GatewayConfig};
pub use protocol::{GatewaySnapshot, Transport};
pub use registry::{DeviceRegistry, PeripheralRecord};
pub use scheduler::{PollScheduler, PollSummary, SchedulerConfig, SchedulerHandle};
pub use state::{Confidence, ReconciledState, StateReconciler};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use telemetry::PeripheralReport;
pub use types::{DeviceModel, PeripheralId, PeripheralKind, TemperatureUnit};
