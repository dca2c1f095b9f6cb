// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway events and their broadcast channel.
//!
//! Every [`GatewayEvent`] the scheduler produces is published on an
//! [`EventBus`] and dispatched to the callbacks registered in
//! [`CallbackRegistry`](crate::subscription::CallbackRegistry).

mod event_bus;
mod gateway_event;

pub use event_bus::EventBus;
pub use gateway_event::GatewayEvent;
