// SPDX-License-Identifier: MPL-2.0

//! Gateway watcher example.
//!
//! Polls an Ecowitt gateway, prints every peripheral it finds and every
//! reconciled state change. Optionally switches one peripheral to show the
//! pending/confirmed cycle.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example watch_gateway -- <host> [peripheral_id on|off]
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example watch_gateway -- 192.168.1.50
//! cargo run --example watch_gateway -- 192.168.1.50 13836 on
//! ```

use std::env;
use std::time::Duration;

use ecowitt_iot::{
    GatewayConfig, GatewayEvent, PeripheralId, PeripheralReport, PollScheduler, SchedulerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 && args.len() != 4 {
        eprintln!("Usage: {} <host> [peripheral_id on|off]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  cargo run --example watch_gateway -- 192.168.1.50");
        eprintln!("  cargo run --example watch_gateway -- 192.168.1.50 13836 on");
        std::process::exit(1);
    }

    let host = &args[1];
    println!("=== Ecowitt Gateway Watcher ===");
    println!("Gateway: {host}");
    println!();

    let client = GatewayConfig::new(host.as_str()).into_client()?;
    let config = SchedulerConfig::new()
        .with_poll_interval(Duration::from_secs(10))
        .with_activation_window(Duration::from_secs(10));

    let scheduler = PollScheduler::new(client, config);
    let mut events = scheduler.subscribe();

    let summary = scheduler.poll_now().await?;
    println!("Found {} peripheral(s)", summary.added.len());
    for error in &summary.errors {
        println!("  skipped: {error}");
    }

    let handle = scheduler.spawn();

    if args.len() == 4 {
        let id: PeripheralId = args[2].parse()?;
        let on = args[3].eq_ignore_ascii_case("on");
        let state = scheduler.issue_command(id, on).await?;
        println!("Command sent, {id} is now {state}");
    }

    let watch = async {
        while let Ok(event) = events.recv().await {
            print_event(&event);
        }
    };

    tokio::select! {
        () = watch => {}
        _ = tokio::signal::ctrl_c() => println!("\nStopping"),
    }

    handle.shutdown().await;
    Ok(())
}

fn print_event(event: &GatewayEvent) {
    match event {
        GatewayEvent::PeripheralAdded { record } => {
            println!(
                "+ {} [{}] {} fw {}",
                record.id(),
                record.model(),
                record.name(),
                record.firmware()
            );
            match record.telemetry() {
                PeripheralReport::WaterTimer(report) => {
                    if let Some(flow) = report.flow_rate {
                        println!("    flow: {flow:.2} L/min");
                    }
                    if let Some(battery) = report.battery {
                        println!("    battery: {}%", battery.percent());
                    }
                }
                PeripheralReport::SmartPlug(report) => {
                    if let Some(power) = report.power {
                        println!("    power: {power:.1} W");
                    }
                }
            }
        }
        GatewayEvent::PeripheralRemoved { id } => println!("- {id}"),
        GatewayEvent::StateChanged { id, state } => println!("  {id}: {state}"),
        GatewayEvent::AvailabilityChanged { available } => {
            println!("  gateway available: {available}");
        }
        GatewayEvent::ReconciliationTimeout { id } => {
            println!("  {id}: command not confirmed, showing reported state");
        }
    }
}
