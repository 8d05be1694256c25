//! Lifecycle ordering across several nodes sharing one host.

use telenode::app::service::NodeHost;
use telenode::config::{BatteryConfig, DistanceConfig, SystemConfig};
use telenode::error::Error;
use telenode::sensors::battery::BatteryNode;
use telenode::sensors::distance::DistanceNode;
use telenode::sensors::range::UnitSystem;

use crate::mock_hw::{BusRecorder, ManualClock, ScriptedDriver};

fn board(bus: BusRecorder) -> NodeHost<BusRecorder> {
    let config = SystemConfig::default();
    let mut host = NodeHost::new(bus);
    let (battery, _) = ScriptedDriver::new(&[3.1]);
    host.register(BatteryNode::from_config(&config.battery, battery).unwrap())
        .unwrap();
    let (ranger, _) = ScriptedDriver::new(&[0.0]);
    host.register(DistanceNode::from_config(&config.distance, config.units, ranger).unwrap())
        .unwrap();
    host
}

#[test]
fn nodes_advertise_under_their_own_ids() {
    let mut host = board(BusRecorder::new(true));
    assert_eq!(host.setup(), Ok(2));

    let bus = host.publisher();
    let battery: Vec<&str> = bus
        .advertised
        .iter()
        .filter(|(n, _)| n == "battery")
        .map(|(_, s)| s.name.as_str())
        .collect();
    assert_eq!(battery, vec!["status", "voltage", "battery"]);
    // Both nodes own a channel called "status".
    assert_eq!(bus.advertised_names().iter().filter(|n| **n == "status").count(), 2);
}

#[test]
fn duplicate_channel_fails_only_the_second_node() {
    let mut host = NodeHost::new(BusRecorder::new(true));
    let config = BatteryConfig::default();
    let (a, _) = ScriptedDriver::new(&[3.0]);
    let (b, _) = ScriptedDriver::new(&[3.0]);
    host.register(BatteryNode::from_config(&config, a).unwrap()).unwrap();
    host.register(BatteryNode::from_config(&config, b).unwrap()).unwrap();

    assert_eq!(host.setup(), Ok(1));
    assert_eq!(host.node_count(), 2);
}

#[test]
fn missing_echo_does_not_block_other_nodes() {
    let clock = ManualClock::at(0);
    let mut host = board(BusRecorder::new(true));
    host.setup().unwrap();

    let outcome = host.run_once(&clock);
    assert!(outcome.became_ready);
    assert_eq!(outcome.measured, 2);
    assert_eq!(outcome.published, 1);

    let bus = host.publisher();
    assert_eq!(bus.values_for("voltage"), vec!["3.10"]);
    // The ranger never read anything valid: one ready error, no values.
    let distance: Vec<&str> = bus
        .sent
        .iter()
        .filter(|s| s.node == "distance")
        .map(|s| s.value.as_str())
        .collect();
    assert_eq!(distance, vec!["error"]);
}

#[test]
fn host_rejects_late_registration() {
    let mut host = board(BusRecorder::new(false));
    host.setup().unwrap();
    let (ranger, _) = ScriptedDriver::new(&[1000.0]);
    let late = DistanceNode::from_config(&DistanceConfig::default(), UnitSystem::Imperial, ranger)
        .unwrap();
    assert_eq!(host.register(late), Err(Error::Lifecycle("register after setup")));
}

#[test]
fn wrapping_clock_keeps_cadence() {
    let mut host = NodeHost::new(BusRecorder::new(true));
    let (battery, _) = ScriptedDriver::new(&[3.0]);
    let config = BatteryConfig {
        read_interval_ms: 1000,
        send_interval_ms: 1000,
        ..BatteryConfig::default()
    };
    host.register(BatteryNode::from_config(&config, battery).unwrap()).unwrap();
    host.setup().unwrap();

    let start = u32::MAX - 500;
    assert_eq!(host.tick(start).measured, 1);
    assert_eq!(host.tick(start.wrapping_add(999)).measured, 0);
    let outcome = host.tick(start.wrapping_add(1000));
    assert_eq!((outcome.measured, outcome.published), (1, 1));
}
