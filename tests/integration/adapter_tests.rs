//! Host-simulation adapters driving real nodes.
//!
//! The simulated peripherals read process-wide atomics, so everything that
//! injects values lives in a single test.

use telenode::adapters::hardware::{
    BatteryAdc, EchoRanger, sim_set_battery_millivolts, sim_set_echo_us,
};
use telenode::adapters::log_publisher::LogPublisher;
use telenode::adapters::nvs::NvsAdapter;
use telenode::app::ports::{ConfigError, ConfigPort, PublishPort};
use telenode::app::service::NodeHost;
use telenode::config::SystemConfig;
use telenode::drivers::hw_init::RangerPins;
use telenode::pins;
use telenode::sensors::battery::BatteryNode;
use telenode::sensors::distance::DistanceNode;
use telenode::sensors::range::UnitSystem;

#[test]
fn simulated_board_runs_through_log_publisher() {
    let config = SystemConfig::default();
    let ranger_pins = RangerPins {
        trigger: config.distance.trigger_pin,
        echo: config.distance.echo_pin,
    };

    sim_set_battery_millivolts(2_950);
    sim_set_echo_us(5_830);

    let mut host = NodeHost::new(LogPublisher::new());
    host.register(
        BatteryNode::from_config(&config.battery, BatteryAdc::new(pins::BATTERY_ADC_CHANNEL))
            .unwrap(),
    )
    .unwrap();
    let mut distance =
        DistanceNode::from_config(&config.distance, UnitSystem::Metric, EchoRanger::new(ranger_pins))
            .unwrap();
    distance.set_change_handler(|_| {});
    host.register(distance).unwrap();

    assert_eq!(host.setup(), Ok(2));
    // status + 2 values for the battery, status + 3 values for the ranger.
    assert_eq!(host.publisher().advertised_count(), 7);

    let outcome = host.tick(0);
    assert_eq!((outcome.measured, outcome.published), (2, 2));
    // battery: status, voltage, level; ranger: status, distance, ping, changed.
    assert_eq!(host.publisher().sent_count(), 7);

    // Echo lost: the ranger goes quiet, the battery keeps its cadence.
    sim_set_echo_us(0);
    let outcome = host.tick(300_000);
    assert_eq!((outcome.measured, outcome.published), (2, 1));

    // A failed ADC read holds the battery back as well.
    sim_set_battery_millivolts(u32::MAX);
    let outcome = host.tick(600_000);
    assert_eq!((outcome.measured, outcome.published), (2, 0));

    sim_set_battery_millivolts(3_000);
}

#[test]
fn unfitted_ranger_is_reported_absent() {
    let mut host = NodeHost::new(LogPublisher::new());
    let ranger = EchoRanger::new(RangerPins {
        trigger: pins::NOT_CONNECTED,
        echo: pins::RANGER_ECHO_GPIO,
    });
    host.register(
        DistanceNode::from_config(&SystemConfig::default().distance, UnitSystem::Metric, ranger)
            .unwrap(),
    )
    .unwrap();
    host.setup().unwrap();

    assert_eq!(host.publisher().advertised_count(), 1);
    assert!(host.signal_ready());
    assert_eq!(host.publisher().sent_count(), 1);
}

#[test]
fn log_publisher_offline_drops_values() {
    let mut publisher = LogPublisher::new();
    publisher.set_connected(false);
    assert!(!publisher.is_connected());
    assert!(publisher.send("battery", "voltage", "3.00").is_err());
    assert_eq!(publisher.sent_count(), 0);
}

#[test]
fn stored_config_survives_reload() {
    let mut nvs = NvsAdapter::new().unwrap();
    assert_eq!(nvs.load(), Err(ConfigError::NotFound));

    let mut config = SystemConfig::default();
    config.units = UnitSystem::Imperial;
    config.distance.min_change_m = 0.25;
    config.temperature.enabled = true;
    nvs.save(&config).unwrap();

    assert_eq!(nvs.load_or_default(), config);
}
