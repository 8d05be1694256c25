//! Ultrasonic echo ranger node.
//!
//! The driver reports the echo round-trip time in microseconds, `0` when no
//! echo came back.  The node converts it to a distance with the speed of
//! sound at the configured air temperature:
//!
//! ```text
//!   c        = 331.4 + 0.6 * T        [m/s]
//!   distance = echo_us * 0.5e-6 * c   [m]
//! ```
//!
//! Every valid distance runs through a [`ChangeGate`]; a change invokes the
//! change handler immediately and raises the `changed` flag, which the next
//! publish pass sends and clears.
//!
//! The ranger is a single-instance node: one trigger/echo pin pair.

use log::{debug, info};

use crate::app::ports::{PublishPort, SamplingDelegate, SensorDriver, Tick};
use crate::config::DistanceConfig;
use crate::error::Result;
use crate::scheduler::{SamplingScheduler, TickOutcome};
use crate::sensors::SensorInstance;
use crate::sensors::change_gate::ChangeGate;
use crate::sensors::channel::{InstanceMode, STATUS_CHANNEL, ValueTemplate};
use crate::sensors::enumerate::ChannelLayout;
use crate::sensors::node::{
    LifecycleState, NodeCore, SensorNode, send_bool, send_float, send_status,
};
use crate::sensors::range::{RangeFixup, UnitSystem};

pub const DISTANCE_CHANNEL: &str = "distance";
pub const PING_CHANNEL: &str = "ping";
pub const CHANGED_CHANNEL: &str = "changed";

pub const FEET_PER_METER: f32 = 3.280_84;

// Value channel slots, in template order.
const SLOT_DISTANCE: usize = 0;
const SLOT_PING: usize = 1;
const SLOT_CHANGED: usize = 2;

/// Speed of sound in air at `celsius`, m/s.
pub fn speed_of_sound(celsius: f32) -> f32 {
    331.4 + 0.6 * celsius
}

/// A distance that passed the change gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceReading {
    /// In the node's units (metres or feet).
    pub distance: f32,
    pub echo_us: f32,
}

pub type ChangeHandler = Box<dyn FnMut(&DistanceReading)>;

pub struct DistanceNode<D: SensorDriver> {
    core: NodeCore,
    driver: D,
    /// Reported distance units per metre.
    unit_scale: f32,
    microseconds_to_meters: f32,
    fixup: RangeFixup,
    gate: ChangeGate,
    echo_us: f32,
    changed: bool,
    on_change: Option<ChangeHandler>,
    values: [ValueTemplate; 3],
}

impl<D: SensorDriver> DistanceNode<D> {
    /// Bounds and `min_change` are in metres and converted to the node's units.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        name: &str,
        driver: D,
        units: UnitSystem,
        min_distance_m: f32,
        max_distance_m: f32,
        min_change_m: f32,
        scheduler: SamplingScheduler,
    ) -> Result<Self> {
        let (unit_scale, unit) = match units {
            UnitSystem::Metric => (1.0, "m"),
            UnitSystem::Imperial => (FEET_PER_METER, "ft"),
        };
        // A zero distance can only come from a missing echo.
        let fixup = RangeFixup::new(
            Some(0.0),
            min_distance_m * unit_scale,
            max_distance_m * unit_scale,
        )?;
        let values = [
            ValueTemplate::float(DISTANCE_CHANNEL, unit, Some(fixup.format()?)),
            ValueTemplate::float(PING_CHANNEL, "µs", None),
            ValueTemplate::boolean(CHANGED_CHANNEL).with_display_name("Obstacle changed"),
        ];
        let mut node = Self {
            core: NodeCore::new(id, name, scheduler),
            driver,
            unit_scale,
            microseconds_to_meters: 0.0,
            fixup,
            gate: ChangeGate::new(min_change_m * unit_scale),
            echo_us: 0.0,
            changed: false,
            on_change: None,
            values,
        };
        node.set_ambient_temperature(20.0);
        Ok(node)
    }

    pub fn from_config(config: &DistanceConfig, units: UnitSystem, driver: D) -> Result<Self> {
        let mut node = Self::new(
            &config.node_id,
            &config.name,
            driver,
            units,
            config.min_distance_m,
            config.max_distance_m,
            config.min_change_m,
            SamplingScheduler::new(config.measurement_interval_ms, config.publish_interval_ms),
        )?;
        node.set_ambient_temperature(config.ambient_temperature_c);
        Ok(node)
    }

    /// Recompute the echo conversion for air at `celsius`.
    pub fn set_ambient_temperature(&mut self, celsius: f32) -> &mut Self {
        let c = speed_of_sound(celsius);
        info!(
            "{}: speed of sound {:.1} m/s at {:.1} °C",
            self.core.id(),
            c,
            celsius
        );
        // Half the round trip: d = t/2 * c
        self.set_microseconds_to_meters(0.5e-6 * c)
    }

    pub fn set_microseconds_to_meters(&mut self, factor: f32) -> &mut Self {
        self.microseconds_to_meters = factor;
        self
    }

    /// Invoked from the measurement pass whenever the distance changes by
    /// more than the gate threshold.
    pub fn set_change_handler(&mut self, handler: impl FnMut(&DistanceReading) + 'static) -> &mut Self {
        self.on_change = Some(Box::new(handler));
        self
    }

    pub fn set_min_change(&mut self, min_change_m: f32) -> &mut Self {
        self.gate.set_threshold(min_change_m * self.unit_scale);
        self
    }

    pub fn microseconds_to_meters(&self) -> f32 {
        self.microseconds_to_meters
    }

    /// Last valid distance in the node's units.
    pub fn distance(&self) -> Option<f32> {
        self.core.instances().first().and_then(SensorInstance::valid_value)
    }

    /// Echo time behind the last valid distance.
    pub fn echo_us(&self) -> Option<f32> {
        self.distance().map(|_| self.echo_us)
    }

    /// A change not yet published.
    pub fn change_pending(&self) -> bool {
        self.changed
    }

    pub fn instances(&self) -> &[SensorInstance] {
        self.core.instances()
    }
}

impl<D: SensorDriver, P: PublishPort> SensorNode<P> for DistanceNode<D> {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn lifecycle(&self) -> LifecycleState {
        self.core.state()
    }

    fn setup(&mut self, publisher: &mut P) -> Result<()> {
        let layout = ChannelLayout {
            mode: InstanceMode::Single,
            status_base: STATUS_CHANNEL,
            values: &self.values,
        };
        self.core.setup(&layout, &mut self.driver, publisher)
    }

    fn tick(&mut self, now: Tick, publisher: &mut P) -> TickOutcome {
        if !self.core.begin_tick() {
            return TickOutcome::default();
        }
        let (node_id, scheduler, instances) = self.core.parts();
        let mut pass = DistancePass {
            node_id,
            driver: &mut self.driver,
            factor: self.microseconds_to_meters * self.unit_scale,
            fixup: &self.fixup,
            gate: &mut self.gate,
            echo_us: &mut self.echo_us,
            changed: &mut self.changed,
            on_change: &mut self.on_change,
            instances,
            publisher,
        };
        scheduler.tick(now, &mut pass)
    }

    fn on_ready_to_operate(&mut self, publisher: &mut P) {
        self.core.on_ready(publisher);
    }
}

struct DistancePass<'a, D, P> {
    node_id: &'a str,
    driver: &'a mut D,
    /// Reported distance units per echo microsecond.
    factor: f32,
    fixup: &'a RangeFixup,
    gate: &'a mut ChangeGate,
    echo_us: &'a mut f32,
    changed: &'a mut bool,
    on_change: &'a mut Option<ChangeHandler>,
    instances: &'a mut [SensorInstance],
    publisher: &'a mut P,
}

impl<D: SensorDriver, P: PublishPort> SamplingDelegate for DistancePass<'_, D, P> {
    fn measure(&mut self, _now: Tick) {
        for instance in self.instances.iter_mut().filter(|i| i.is_present()) {
            let echo_us = self.driver.read_raw(instance.index);
            let reading = self.fixup.fix(instance.index, echo_us * self.factor);
            instance.apply(&reading);
            debug!(
                "{}: echo {} µs, distance {} {:?}",
                self.node_id, echo_us, reading.value, instance.validity
            );
            if !instance.is_valid() {
                continue;
            }
            *self.echo_us = echo_us;
            if self.gate.evaluate(reading.value) {
                *self.changed = true;
                info!("{}: obstacle changed, distance {:.2}", self.node_id, reading.value);
                if let Some(handler) = self.on_change.as_mut() {
                    handler(&DistanceReading {
                        distance: reading.value,
                        echo_us,
                    });
                }
            }
        }
    }

    fn has_valid_reading(&self) -> bool {
        self.instances.iter().any(SensorInstance::is_valid)
    }

    fn publish(&mut self, _now: Tick) {
        for instance in self.instances.iter() {
            send_status(self.publisher, self.node_id, instance);
            let Some(distance) = instance.valid_value() else {
                continue;
            };
            if let Some(channel) = instance.value_channel(SLOT_DISTANCE) {
                send_float(self.publisher, self.node_id, channel, distance);
            }
            if let Some(channel) = instance.value_channel(SLOT_PING) {
                send_float(self.publisher, self.node_id, channel, *self.echo_us);
            }
            if let Some(channel) = instance.value_channel(SLOT_CHANGED) {
                send_bool(self.publisher, self.node_id, channel, *self.changed);
            }
            *self.changed = false;
        }
    }
}
