// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the gateway's local API.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use super::payload::{self, Envelope, GatewayCommand};
use crate::error::TransportError;
use crate::protocol::{Ack, GatewaySnapshot, ReadOutcome, SnapshotEntry, Transport};
use crate::telemetry::DeviceListing;
use crate::types::{DeviceModel, PeripheralId, TemperatureUnit};

const DEVICE_LIST_PATH: &str = "/get_iot_device_list";
const COMMAND_PATH: &str = "/parse_quick_cmd_iot";

// ============================================================================
// GatewayConfig
// ============================================================================

/// Configuration of a gateway endpoint.
///
/// Fixed once the client is built; changing it means building a new client.
///
/// # Examples
///
/// ```
/// use ecowitt_iot::protocol::GatewayConfig;
/// use ecowitt_iot::types::TemperatureUnit;
/// use std::time::Duration;
///
/// let config = GatewayConfig::new("192.168.1.50")
///     .with_port(8080)
///     .with_timeout(Duration::from_secs(5))
///     .with_temperature_unit(TemperatureUnit::Fahrenheit);
///
/// assert_eq!(config.base_url(), "http://192.168.1.50:8080");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    host: String,
    port: u16,
    timeout: Duration,
    temperature_unit: TemperatureUnit,
}

impl GatewayConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the gateway at `host`.
    ///
    /// `host` may be a bare host, `host:port`, or a full `http://` URL.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
            temperature_unit: TemperatureUnit::default(),
        }
    }

    /// Sets a custom port. Ignored when `host` already names one.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the temperature unit.
    #[must_use]
    pub fn with_temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.temperature_unit = unit;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the temperature unit.
    #[must_use]
    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.temperature_unit
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            return host.to_string();
        }
        if host.contains(':') || self.port == Self::DEFAULT_PORT {
            format!("http://{host}")
        } else {
            format!("http://{host}:{}", self.port)
        }
    }

    /// Creates a [`GatewayClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidAddress` if the host is empty or the
    /// HTTP client cannot be created.
    pub fn into_client(self) -> Result<GatewayClient, TransportError> {
        if self.host.trim().is_empty() {
            return Err(TransportError::InvalidAddress(
                "host is required".to_string(),
            ));
        }

        let base_url = self.base_url();
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::InvalidAddress(e.to_string()))?;

        Ok(GatewayClient {
            base_url,
            client,
            temperature_unit: self.temperature_unit,
        })
    }
}

// ============================================================================
// GatewayClient
// ============================================================================

/// HTTP client for one Ecowitt gateway.
///
/// # Examples
///
/// ```no_run
/// use ecowitt_iot::protocol::{GatewayConfig, Transport};
///
/// # async fn example() -> ecowitt_iot::Result<()> {
/// let client = GatewayConfig::new("192.168.1.50").into_client()?;
/// let snapshot = client.fetch_status().await?;
/// println!("{} peripherals", snapshot.entries.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    client: Client,
    temperature_unit: TemperatureUnit,
}

impl GatewayClient {
    /// Returns the base URL of the gateway.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the raw device list.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails or the body is not a
    /// device list.
    pub async fn list_devices(&self) -> Result<Vec<serde_json::Value>, TransportError> {
        let url = format!("{}{DEVICE_LIST_PATH}", self.base_url);
        tracing::debug!(url = %url, "Fetching device list");

        let response = self.client.get(&url).send().await?;
        let body = Self::read_body(response).await?;
        payload::parse_device_list(&body)
    }

    /// Reads the status of one peripheral.
    pub async fn read_device(&self, id: PeripheralId, model: DeviceModel) -> ReadOutcome {
        match self.post(&GatewayCommand::read(id, model)).await {
            Ok(body) => payload::parse_read_reply(&body),
            Err(e) => ReadOutcome::Failed(e),
        }
    }

    async fn post(&self, command: &GatewayCommand) -> Result<String, TransportError> {
        let url = format!("{}{COMMAND_PATH}", self.base_url);
        let envelope = Envelope::from(command.clone());

        tracing::debug!(url = %url, ?command, "Sending gateway command");

        let response = self.client.post(&url).json(&envelope).send().await?;
        Self::read_body(response).await
    }

    async fn read_body(response: reqwest::Response) -> Result<String, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Unreachable(format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.text().await?;
        tracing::debug!(body = %payload::clean_body(&body), "Received gateway response");
        Ok(body)
    }
}

impl Transport for GatewayClient {
    async fn fetch_status(&self) -> Result<GatewaySnapshot, TransportError> {
        let taken_at = Utc::now();
        let listings = self.list_devices().await?;

        let mut entries = Vec::with_capacity(listings.len());
        for listing in listings {
            let target = DeviceListing::from_value(&listing)
                .ok()
                .and_then(|l| l.model().ok().map(|m| (l.id(), m)));

            let status = match target {
                Some((id, model)) => {
                    let outcome = self.read_device(id, model).await;
                    if let ReadOutcome::Failed(e) = &outcome {
                        tracing::warn!(peripheral_id = %id, error = %e, "Status read failed");
                    }
                    outcome
                }
                None => ReadOutcome::Skipped,
            };
            entries.push(SnapshotEntry::new(listing, status));
        }

        Ok(GatewaySnapshot::new(taken_at, entries))
    }

    async fn send_command(
        &self,
        id: PeripheralId,
        model: DeviceModel,
        on: bool,
    ) -> Result<Ack, TransportError> {
        let body = self.post(&GatewayCommand::switch(id, model, on)).await?;
        let result = payload::parse_command_reply(&body);
        if let Err(e) = &result {
            tracing::warn!(peripheral_id = %id, on, error = %e, "Gateway rejected command");
        }
        result
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        self.temperature_unit
    }
}
