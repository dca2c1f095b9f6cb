// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request bodies and reply interpretation for the gateway's local API.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::protocol::{Ack, ReadOutcome};
use crate::types::{DeviceModel, PeripheralId};

/// Reply the gateway sends for accepted commands and for reads without data.
pub const OK_REPLY: &str = "200 OK";

/// A single command for `POST /parse_quick_cmd_iot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum GatewayCommand {
    /// Reads the current status of a peripheral.
    ReadDevice {
        /// Peripheral id.
        id: u32,
        /// Gateway model number.
        model: u8,
    },
    /// Opens the valve or closes the relay until stopped.
    QuickRun {
        /// Start condition (0 = immediately).
        on_type: u8,
        /// Stop condition (0 = manual).
        off_type: u8,
        /// Run until explicitly stopped.
        always_on: u8,
        /// Start delay.
        on_time: u32,
        /// Run duration.
        off_time: u32,
        /// Quantity type for volume-limited runs.
        val_type: u8,
        /// Quantity for volume-limited runs.
        val: u32,
        /// Peripheral id.
        id: u32,
        /// Gateway model number.
        model: u8,
    },
    /// Closes the valve or opens the relay.
    QuickStop {
        /// Peripheral id.
        id: u32,
        /// Gateway model number.
        model: u8,
    },
}

impl GatewayCommand {
    /// Builds a status read.
    #[must_use]
    pub fn read(id: PeripheralId, model: DeviceModel) -> Self {
        Self::ReadDevice {
            id: id.value(),
            model: model.code(),
        }
    }

    /// Builds the command that switches a peripheral on or off indefinitely.
    #[must_use]
    pub fn switch(id: PeripheralId, model: DeviceModel, on: bool) -> Self {
        if on {
            Self::QuickRun {
                on_type: 0,
                off_type: 0,
                always_on: 1,
                on_time: 0,
                off_time: 0,
                val_type: 0,
                val: 0,
                id: id.value(),
                model: model.code(),
            }
        } else {
            Self::QuickStop {
                id: id.value(),
                model: model.code(),
            }
        }
    }
}

/// The `{"command":[...]}` framing used in both directions.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) command: Vec<T>,
}

impl From<GatewayCommand> for Envelope<GatewayCommand> {
    fn from(command: GatewayCommand) -> Self {
        Self {
            command: vec![command],
        }
    }
}

/// Strips the padding the gateway puts around its replies.
#[must_use]
pub fn clean_body(body: &str) -> &str {
    body.trim_matches(|c| matches!(c, ' ' | '%' | '\r' | '\n'))
}

fn check_json_body(body: &str) -> Result<(), TransportError> {
    if body.is_empty() {
        return Err(TransportError::MalformedResponse("empty body".to_string()));
    }
    if body.starts_with('<') {
        return Err(TransportError::MalformedResponse(
            "HTML body where JSON was expected".to_string(),
        ));
    }
    Ok(())
}

/// Interprets the reply to `GET /get_iot_device_list`.
///
/// # Errors
///
/// Returns `TransportError::MalformedResponse` for empty, HTML or non-JSON
/// bodies and for bodies without a `command` array.
pub fn parse_device_list(body: &str) -> Result<Vec<serde_json::Value>, TransportError> {
    let body = clean_body(body);
    check_json_body(body)?;
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| TransportError::MalformedResponse(format!("device list: {e}")))?;
    Ok(envelope.command)
}

/// Interprets the reply to a `read_device` command.
#[must_use]
pub fn parse_read_reply(body: &str) -> ReadOutcome {
    let body = clean_body(body);
    if body == OK_REPLY {
        return ReadOutcome::Acknowledged;
    }
    if let Err(e) = check_json_body(body) {
        return ReadOutcome::Failed(e);
    }
    match serde_json::from_str::<Envelope<serde_json::Value>>(body) {
        Ok(envelope) => match envelope.command.into_iter().next() {
            Some(status) => ReadOutcome::Reported(status),
            None => ReadOutcome::Failed(TransportError::MalformedResponse(
                "empty command array".to_string(),
            )),
        },
        Err(e) => ReadOutcome::Failed(TransportError::MalformedResponse(format!(
            "device status: {e}"
        ))),
    }
}

/// Interprets the reply to a switching command.
///
/// # Errors
///
/// Returns `TransportError::RejectedCommand` carrying the reply for anything
/// but `200 OK`.
pub fn parse_command_reply(body: &str) -> Result<Ack, TransportError> {
    let body = clean_body(body);
    if body == OK_REPLY {
        Ok(Ack)
    } else {
        Err(TransportError::RejectedCommand(body.to_string()))
    }
}
