//! Telenode Firmware: Main Entry Point
//!
//! Wires the hardware adapters to the sensor nodes and hands them to the
//! node host, which then owns the loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BatteryAdc    EchoRanger    LogPublisher   NvsAdapter         │
//! │  (SensorDriver)(SensorDriver)(PublishPort)  (ConfigPort)       │
//! │  TimeAdapter (ClockPort)                                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeHost (pure logic)                     │    │
//! │  │  BatteryNode · DistanceNode · SamplingScheduler        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::hal::delay::FreeRtos;

use telenode::adapters::hardware::{BatteryAdc, EchoRanger};
use telenode::adapters::log_publisher::LogPublisher;
use telenode::adapters::nvs::NvsAdapter;
use telenode::adapters::time::TimeAdapter;
use telenode::app::service::NodeHost;
use telenode::config::SystemConfig;
use telenode::drivers::hw_init::{self, RangerPins};
use telenode::pins;
use telenode::sensors::battery::BatteryNode;
use telenode::sensors::distance::DistanceNode;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Telenode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => nvs.load_or_default(),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Initialise hardware peripherals ────────────────────
    let ranger_pins = RangerPins {
        trigger: config.distance.trigger_pin,
        echo: config.distance.echo_pin,
    };
    hw_init::init_peripherals(ranger_pins)?;
    if let Err(e) = hw_init::init_isr_service(ranger_pins) {
        log::error!("ISR service init failed: {}, ranger will report no echo", e);
    }

    // ── 4. Construct nodes ────────────────────────────────────
    let mut host = NodeHost::new(LogPublisher::new());

    if config.battery.enabled {
        let battery = BatteryNode::from_config(
            &config.battery,
            BatteryAdc::new(pins::BATTERY_ADC_CHANNEL),
        )?;
        host.register(battery)?;
    }

    if config.distance.enabled {
        let mut distance = DistanceNode::from_config(
            &config.distance,
            config.units,
            EchoRanger::new(ranger_pins),
        )?;
        distance.set_change_handler(|reading| {
            info!(
                "Obstacle moved: {:.2} (echo {:.0} µs)",
                reading.distance, reading.echo_us
            );
        });
        host.register(distance)?;
    }

    if config.temperature.enabled {
        warn!(
            "Temperature node enabled but no one-wire bus driver is built in (GPIO {}), skipping",
            pins::ONE_WIRE_GPIO
        );
    }

    // ── 5. Setup and loop ─────────────────────────────────────
    let active = host.setup()?;
    if active == 0 {
        warn!("No sensor nodes active");
    }

    info!("System ready. Entering node loop.");
    host.run_forever(&TimeAdapter::new(), &mut FreeRtos, config.loop_interval_ms)
}
