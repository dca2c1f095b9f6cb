// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the gateway HTTP client using wiremock.

#![cfg(feature = "http")]

use std::time::Duration;

use ecowitt_iot::protocol::{GatewayClient, GatewayConfig, ReadOutcome, Transport};
use ecowitt_iot::state::Confidence;
use ecowitt_iot::types::{DeviceModel, PeripheralId};
use ecowitt_iot::{GatewayEvent, PeripheralReport, PollScheduler, SchedulerConfig, TransportError};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GatewayClient {
    GatewayConfig::new(server.uri())
        .with_timeout(Duration::from_millis(500))
        .into_client()
        .unwrap()
}

async fn mount_device_list(server: &MockServer, devices: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/get_iot_device_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "command": devices })))
        .mount(server)
        .await;
}

async fn mount_read(server: &MockServer, id: u32, model: u8, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/parse_quick_cmd_iot"))
        .and(body_json(json!({
            "command": [{"cmd": "read_device", "id": id, "model": model}]
        })))
        .respond_with(reply)
        .mount(server)
        .await;
}

fn status(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "command": [body] }))
}

// ============================================================================
// GatewayClient Tests
// ============================================================================

mod gateway_client {
    use super::*;

    #[tokio::test]
    async fn list_devices_returns_raw_entries() {
        let server = MockServer::start().await;
        mount_device_list(
            &server,
            json!([
                {"id": 13836, "model": 1, "ver": 113, "nickname": "Garden"},
                {"id": 8721, "model": 2, "ver": 105}
            ]),
        )
        .await;

        let devices = client(&server).list_devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0]["nickname"], "Garden");
    }

    #[tokio::test]
    async fn list_devices_tolerates_padding() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_iot_device_list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"command\":[{\"id\":1,\"model\":1}]} %\r\n"),
            )
            .mount(&server)
            .await;

        let devices = client(&server).list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
    }

    #[tokio::test]
    async fn html_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_iot_device_list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = client(&server).list_devices().await.unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn http_error_status_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_iot_device_list"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).list_devices().await.unwrap_err();
        assert!(err.is_unreachable());
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_iot_device_list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"command": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client(&server).fetch_status().await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn read_device_reports_status() {
        let server = MockServer::start().await;
        mount_read(
            &server,
            8721,
            2,
            status(json!({"id": 8721, "model": 2, "ac_status": 1, "realtime_power": 12})),
        )
        .await;

        let outcome = client(&server)
            .read_device(PeripheralId::new(8721), DeviceModel::Ac1100)
            .await;
        let ReadOutcome::Reported(value) = outcome else {
            panic!("expected a report, got {outcome:?}");
        };
        assert_eq!(value["ac_status"], 1);
    }

    #[tokio::test]
    async fn read_device_ok_without_data() {
        let server = MockServer::start().await;
        mount_read(
            &server,
            5,
            1,
            ResponseTemplate::new(200).set_body_string("200 OK"),
        )
        .await;

        let outcome = client(&server)
            .read_device(PeripheralId::new(5), DeviceModel::Wfc01)
            .await;
        assert_eq!(outcome, ReadOutcome::Acknowledged);
    }

    #[tokio::test]
    async fn switch_on_sends_quick_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse_quick_cmd_iot"))
            .and(body_json(json!({"command": [{
                "cmd": "quick_run", "on_type": 0, "off_type": 0, "always_on": 1,
                "on_time": 0, "off_time": 0, "val_type": 0, "val": 0,
                "id": 13836, "model": 1
            }]})))
            .respond_with(ResponseTemplate::new(200).set_body_string("200 OK"))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .send_command(PeripheralId::new(13836), DeviceModel::Wfc01, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn switch_off_sends_quick_stop() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse_quick_cmd_iot"))
            .and(body_json(json!({"command": [{
                "cmd": "quick_stop", "id": 8721, "model": 2
            }]})))
            .respond_with(ResponseTemplate::new(200).set_body_string("200 OK\r\n"))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .send_command(PeripheralId::new(8721), DeviceModel::Ac1100, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_reply_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse_quick_cmd_iot"))
            .respond_with(ResponseTemplate::new(200).set_body_string("300 device offline"))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_command(PeripheralId::new(1), DeviceModel::Wfc02, true)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::RejectedCommand("300 device offline".to_string())
        );
    }
}

// ============================================================================
// fetch_status Tests
// ============================================================================

mod fetch_status {
    use super::*;

    #[tokio::test]
    async fn reads_supported_models_only() {
        let server = MockServer::start().await;
        mount_device_list(
            &server,
            json!([
                {"id": 13836, "model": 1},
                {"id": 99, "model": 17}
            ]),
        )
        .await;
        mount_read(
            &server,
            13836,
            1,
            status(json!({"water_status": 1, "water_running": 1})),
        )
        .await;

        let snapshot = client(&server).fetch_status().await.unwrap();
        assert_eq!(snapshot.entries.len(), 2);
        assert!(matches!(
            snapshot.entries[0].status,
            ReadOutcome::Reported(_)
        ));
        assert_eq!(snapshot.entries[1].status, ReadOutcome::Skipped);
    }

    #[tokio::test]
    async fn failed_read_keeps_other_entries() {
        let server = MockServer::start().await;
        mount_device_list(
            &server,
            json!([
                {"id": 1, "model": 2},
                {"id": 2, "model": 2}
            ]),
        )
        .await;
        mount_read(&server, 1, 2, ResponseTemplate::new(500)).await;
        mount_read(&server, 2, 2, status(json!({"ac_status": 0}))).await;

        let snapshot = client(&server).fetch_status().await.unwrap();
        assert!(matches!(
            snapshot.entries[0].status,
            ReadOutcome::Failed(ref e) if e.is_unreachable()
        ));
        assert!(matches!(
            snapshot.entries[1].status,
            ReadOutcome::Reported(_)
        ));
    }
}

// ============================================================================
// PollScheduler over HTTP
// ============================================================================

mod scheduler {
    use super::*;

    #[tokio::test]
    async fn poll_discovers_and_command_goes_pending() {
        let server = MockServer::start().await;
        mount_device_list(
            &server,
            json!([{"id": 8721, "model": 2, "nickname": "Pump"}]),
        )
        .await;
        mount_read(
            &server,
            8721,
            2,
            status(json!({"ac_status": 0, "realtime_power": 0, "ac_voltage": "230"})),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/parse_quick_cmd_iot"))
            .and(body_partial_json(json!({"command": [{"cmd": "quick_run"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_string("200 OK"))
            .expect(1)
            .mount(&server)
            .await;

        let scheduler = PollScheduler::new(client(&server), SchedulerConfig::default());
        let mut events = scheduler.subscribe();

        let summary = scheduler.poll_now().await.unwrap();
        assert_eq!(summary.added, vec![PeripheralId::new(8721)]);

        let Ok(GatewayEvent::PeripheralAdded { record }) = events.try_recv() else {
            panic!("expected PeripheralAdded first");
        };
        assert_eq!(record.name(), "Pump");
        assert!(matches!(record.telemetry(), PeripheralReport::SmartPlug(_)));

        let state = scheduler
            .issue_command(PeripheralId::new(8721), true)
            .await
            .unwrap();
        assert!(state.is_on());
        assert_eq!(state.confidence(), Confidence::Pending);
    }
}
