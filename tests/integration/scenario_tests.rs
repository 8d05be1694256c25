//! End-to-end sampling scenarios through [`NodeHost`].
//!
//! Each test wires real nodes to scripted drivers and a recording bus, then
//! steps the host loop tick by tick.

use std::cell::RefCell;
use std::rc::Rc;

use telenode::app::service::NodeHost;
use telenode::config::DistanceConfig;
use telenode::scheduler::SamplingScheduler;
use telenode::sensors::channel::{Datatype, InstanceMode};
use telenode::sensors::distance::{DistanceNode, DistanceReading};
use telenode::sensors::range::UnitSystem;
use telenode::sensors::temperature::{DISCONNECTED_C, TemperatureNode};

use crate::mock_hw::{BusRecorder, ManualClock, ScriptedDriver};

fn probes(values: &[f32]) -> (TemperatureNode<ScriptedDriver>, crate::mock_hw::Script) {
    let (driver, script) = ScriptedDriver::new(values);
    let node = TemperatureNode::new(
        "temperature",
        "Temperature",
        driver,
        UnitSystem::Metric,
        InstanceMode::Multi,
        SamplingScheduler::new(1000, 5000),
    )
    .unwrap();
    (node, script)
}

// ── Two instances, measure every second, publish every five ──

#[test]
fn measurement_and_publish_cadences_are_independent() {
    let (node, _script) = probes(&[21.0, 22.5]);
    let mut host = NodeHost::new(BusRecorder::new(true));
    host.register(node).unwrap();
    host.setup().unwrap();

    // First tick always runs both passes.
    let first = host.tick(0);
    assert_eq!((first.measured, first.published), (1, 1));
    host.publisher_mut().clear_sent();

    for t in [1000, 2000, 3000, 4000] {
        let outcome = host.tick(t);
        assert_eq!(outcome.measured, 1, "measure at {t}");
        assert_eq!(outcome.published, 0, "no publish at {t}");
    }
    assert!(host.publisher().sent.is_empty());

    let outcome = host.tick(5000);
    assert_eq!((outcome.measured, outcome.published), (1, 1));
    let bus = host.publisher();
    assert_eq!(bus.values_for("status-0"), vec!["ok"]);
    assert_eq!(bus.values_for("status-1"), vec!["ok"]);
    assert_eq!(bus.values_for("temperature-0"), vec!["21.00"]);
    assert_eq!(bus.values_for("temperature-1"), vec!["22.50"]);
}

#[test]
fn ticks_between_thresholds_do_nothing() {
    let (node, _script) = probes(&[21.0]);
    let mut host = NodeHost::new(BusRecorder::new(true));
    host.register(node).unwrap();
    host.setup().unwrap();
    host.tick(0);

    for t in (50..1000).step_by(50) {
        let outcome = host.tick(t);
        assert_eq!((outcome.measured, outcome.published), (0, 0), "at {t}");
    }
}

#[test]
fn later_measurement_is_what_gets_published() {
    let (node, script) = probes(&[21.0]);
    let mut host = NodeHost::new(BusRecorder::new(true));
    host.register(node).unwrap();
    host.setup().unwrap();
    host.tick(0);

    script.borrow_mut()[0] = 23.25;
    for t in (1000..=5000).step_by(1000) {
        host.tick(t);
    }
    assert_eq!(host.publisher().values_for("temperature-0"), vec!["21.00", "23.25"]);
}

// ── No sensors found ──────────────────────────────────────────

#[test]
fn absent_sensor_advertises_one_status_channel() {
    let (node, _script) = probes(&[]);
    let mut host = NodeHost::new(BusRecorder::new(false));
    host.register(node).unwrap();
    host.setup().unwrap();

    let bus = host.publisher();
    assert_eq!(bus.advertised.len(), 1);
    let (node_id, spec) = &bus.advertised[0];
    assert_eq!(node_id, "temperature");
    assert_eq!(spec.name.as_str(), "status");
    assert_eq!(spec.datatype, Datatype::Enum);
    assert_eq!(spec.format.as_deref(), Some("error,ok"));

    // Nothing valid ever arrives, so no scheduled publish happens.
    let clock = ManualClock::at(0);
    for t in (0..20_000).step_by(1000) {
        clock.set(t);
        assert_eq!(host.run_once(&clock).published, 0);
    }

    host.publisher_mut().connected = true;
    clock.set(20_000);
    assert!(host.run_once(&clock).became_ready);
    assert_eq!(host.publisher().values_for("status"), vec!["error"]);
    assert_eq!(host.publisher().sent.len(), 1);
}

// ── Never valid, then ready ───────────────────────────────────

#[test]
fn ready_flushes_error_for_every_invalid_instance() {
    let (node, _script) = probes(&[DISCONNECTED_C, DISCONNECTED_C]);
    let mut host = NodeHost::new(BusRecorder::new(false));
    host.register(node).unwrap();
    host.setup().unwrap();

    let clock = ManualClock::at(0);
    for t in (0..12_000).step_by(50) {
        clock.set(t);
        host.run_once(&clock);
    }
    assert!(host.publisher().sent.is_empty());

    clock.set(12_000);
    host.publisher_mut().connected = true;
    let outcome = host.run_once(&clock);
    assert!(outcome.became_ready);
    assert_eq!(outcome.published, 0);

    let bus = host.publisher();
    assert_eq!(bus.values_for("status-0"), vec!["error"]);
    assert_eq!(bus.values_for("status-1"), vec!["error"]);
    assert!(bus.values_for("temperature-0").is_empty());
}

#[test]
fn ready_skips_instances_that_are_valid() {
    let (node, _script) = probes(&[20.0, DISCONNECTED_C]);
    let mut host = NodeHost::new(BusRecorder::new(true));
    host.register(node).unwrap();
    host.setup().unwrap();

    host.tick(0);
    host.publisher_mut().clear_sent();
    assert!(host.signal_ready());

    let bus = host.publisher();
    assert!(bus.values_for("status-0").is_empty());
    assert_eq!(bus.values_for("status-1"), vec!["error"]);
}

#[test]
fn reconnected_probe_resumes_publishing() {
    let (node, script) = probes(&[DISCONNECTED_C]);
    let mut host = NodeHost::new(BusRecorder::new(true));
    host.register(node).unwrap();
    host.setup().unwrap();

    assert_eq!(host.tick(0).published, 0);
    script.borrow_mut()[0] = 19.5;
    // Publish was due since t=0; the first valid measurement releases it.
    assert_eq!(host.tick(1000).published, 1);
    assert_eq!(host.publisher().values_for("temperature-0"), vec!["19.50"]);
}

// ── Ranger with change detection ──────────────────────────────

#[test]
fn ranger_reports_changes_through_handler_and_channel() {
    let (driver, script) = ScriptedDriver::new(&[2915.0]);
    let config = DistanceConfig::default();
    let mut node = DistanceNode::from_config(&config, UnitSystem::Metric, driver).unwrap();

    let seen: Rc<RefCell<Vec<DistanceReading>>> = Rc::default();
    let sink = Rc::clone(&seen);
    node.set_change_handler(move |reading| sink.borrow_mut().push(*reading));

    let mut host = NodeHost::new(BusRecorder::new(true));
    host.register(node).unwrap();
    host.setup().unwrap();
    assert_eq!(
        host.publisher().advertised_names(),
        vec!["status", "distance", "ping", "changed"]
    );

    host.tick(0);
    assert_eq!(host.publisher().values_for("distance"), vec!["0.50"]);
    assert_eq!(host.publisher().values_for("changed"), vec!["true"]);
    assert_eq!(seen.borrow().len(), 1);

    // Sub-threshold wobble.
    script.borrow_mut()[0] = 2950.0;
    for t in (1000..=5000).step_by(1000) {
        host.tick(t);
    }
    assert_eq!(host.publisher().values_for("changed"), vec!["true", "false"]);
    assert_eq!(seen.borrow().len(), 1);

    // Obstacle moves ~35 cm away.
    script.borrow_mut()[0] = 5000.0;
    host.tick(6000);
    assert_eq!(seen.borrow().len(), 2);
    let last = seen.borrow()[1];
    assert!((last.distance - 0.8585).abs() < 0.001);
    assert_eq!(last.echo_us, 5000.0);
}
