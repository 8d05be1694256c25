//! One-wire temperature probe node.
//!
//! Reads every probe on a one-wire bus through a [`SensorDriver`]; the bus
//! search and conversion timing live in the driver.  In multi-instance mode
//! each probe is published under its ROM address.
//!
//! Raw values are in the node's unit system, with the driver reporting the
//! matching disconnect sentinel ([`DISCONNECTED_C`] / [`DISCONNECTED_F`]).

use log::debug;

use crate::app::ports::{PublishPort, SamplingDelegate, SensorDriver, Tick};
use crate::config::TemperatureConfig;
use crate::error::Result;
use crate::scheduler::{SamplingScheduler, TickOutcome};
use crate::sensors::SensorInstance;
use crate::sensors::channel::{InstanceMode, STATUS_CHANNEL, ValueTemplate};
use crate::sensors::enumerate::ChannelLayout;
use crate::sensors::node::{LifecycleState, NodeCore, SensorNode, send_float, send_status};
use crate::sensors::range::{RangeFixup, UnitSystem};

/// Reading a probe that dropped off the bus, in °C.
pub const DISCONNECTED_C: f32 = -127.0;
/// Reading a probe that dropped off the bus, in °F.
pub const DISCONNECTED_F: f32 = -196.6;

/// `(sentinel, min, max)` per unit system.
const METRIC: (f32, f32, f32) = (DISCONNECTED_C, -55.0, 125.0);
const IMPERIAL: (f32, f32, f32) = (DISCONNECTED_F, -67.0, 257.0);

pub const TEMPERATURE_CHANNEL: &str = "temperature";

pub struct TemperatureNode<D: SensorDriver> {
    core: NodeCore,
    driver: D,
    mode: InstanceMode,
    fixup: RangeFixup,
    values: [ValueTemplate; 1],
}

impl<D: SensorDriver> TemperatureNode<D> {
    pub fn new(
        id: &str,
        name: &str,
        driver: D,
        units: UnitSystem,
        mode: InstanceMode,
        scheduler: SamplingScheduler,
    ) -> Result<Self> {
        let ((sentinel, min, max), unit) = match units {
            UnitSystem::Metric => (METRIC, "°C"),
            UnitSystem::Imperial => (IMPERIAL, "°F"),
        };
        let fixup = RangeFixup::new(Some(sentinel), min, max)?;
        let value = ValueTemplate::float(TEMPERATURE_CHANNEL, unit, Some(fixup.format()?));
        Ok(Self {
            core: NodeCore::new(id, name, scheduler),
            driver,
            mode,
            fixup,
            values: [value],
        })
    }

    pub fn from_config(config: &TemperatureConfig, units: UnitSystem, driver: D) -> Result<Self> {
        Self::new(
            &config.node_id,
            &config.name,
            driver,
            units,
            config.mode,
            SamplingScheduler::new(config.measurement_interval_ms, config.publish_interval_ms),
        )
    }

    /// Last valid temperature of instance `index`.
    pub fn temperature(&self, index: usize) -> Option<f32> {
        self.core.instances().get(index).and_then(SensorInstance::valid_value)
    }

    pub fn instances(&self) -> &[SensorInstance] {
        self.core.instances()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: SensorDriver, P: PublishPort> SensorNode<P> for TemperatureNode<D> {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn lifecycle(&self) -> LifecycleState {
        self.core.state()
    }

    fn setup(&mut self, publisher: &mut P) -> Result<()> {
        let layout = ChannelLayout {
            mode: self.mode,
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
        let mut pass = TemperaturePass {
            node_id,
            driver: &mut self.driver,
            fixup: &self.fixup,
            instances,
            publisher,
        };
        scheduler.tick(now, &mut pass)
    }

    fn on_ready_to_operate(&mut self, publisher: &mut P) {
        self.core.on_ready(publisher);
    }
}

struct TemperaturePass<'a, D, P> {
    node_id: &'a str,
    driver: &'a mut D,
    fixup: &'a RangeFixup,
    instances: &'a mut [SensorInstance],
    publisher: &'a mut P,
}

impl<D: SensorDriver, P: PublishPort> SamplingDelegate for TemperaturePass<'_, D, P> {
    fn measure(&mut self, _now: Tick) {
        // One conversion request covers every probe on the bus.
        self.driver.request_conversion();
        for instance in self.instances.iter_mut().filter(|i| i.is_present()) {
            let reading = self.fixup.fix(instance.index, self.driver.read_raw(instance.index));
            instance.apply(&reading);
            debug!(
                "{}: probe {} raw={} value={} {:?}",
                self.node_id,
                instance.index,
                reading.raw_value,
                reading.value,
                instance.validity
            );
        }
    }

    fn has_valid_reading(&self) -> bool {
        self.instances.iter().any(SensorInstance::is_valid)
    }

    fn publish(&mut self, _now: Tick) {
        for instance in self.instances.iter() {
            send_status(self.publisher, self.node_id, instance);
            if let (Some(value), Some(channel)) = (instance.valid_value(), instance.value_channel(0)) {
                send_float(self.publisher, self.node_id, channel, value);
            }
        }
    }
}
