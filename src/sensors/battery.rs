//! ADC supply-voltage node.
//!
//! Reads the battery pin voltage, applies a correction factor (divider
//! ratio, calibration) and derives a charge level from a linear
//! empty/full voltage window.  There is no disconnect sentinel; a NaN from
//! the driver marks the reading disconnected.

use log::debug;

use crate::app::ports::{PublishPort, SamplingDelegate, SensorDriver, Tick};
use crate::config::BatteryConfig;
use crate::error::Result;
use crate::scheduler::{SamplingScheduler, TickOutcome};
use crate::sensors::SensorInstance;
use crate::sensors::channel::{InstanceMode, STATUS_CHANNEL, ValueTemplate, range_format};
use crate::sensors::enumerate::ChannelLayout;
use crate::sensors::node::{LifecycleState, NodeCore, SensorNode, send_float, send_status};
use crate::sensors::range::RangeFixup;

pub const VOLTAGE_CHANNEL: &str = "voltage";
pub const BATTERY_CHANNEL: &str = "battery";

const SLOT_VOLTAGE: usize = 0;
const SLOT_LEVEL: usize = 1;

/// Linear charge window, in volts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeCurve {
    pub empty_volts: f32,
    pub full_volts: f32,
}

impl ChargeCurve {
    /// Charge level in percent, clamped to 0..=100.
    pub fn level(&self, volts: f32) -> f32 {
        let span = self.full_volts - self.empty_volts;
        ((volts - self.empty_volts) / span * 100.0).clamp(0.0, 100.0)
    }
}

pub struct BatteryNode<D: SensorDriver> {
    core: NodeCore,
    driver: D,
    correction: f32,
    curve: ChargeCurve,
    fixup: RangeFixup,
    values: [ValueTemplate; 2],
}

impl<D: SensorDriver> BatteryNode<D> {
    pub fn new(
        id: &str,
        name: &str,
        driver: D,
        correction: f32,
        curve: ChargeCurve,
        full_scale_volts: f32,
        scheduler: SamplingScheduler,
    ) -> Result<Self> {
        let fixup = RangeFixup::new(None, 0.0, full_scale_volts)?;
        let values = [
            ValueTemplate::float(VOLTAGE_CHANNEL, "V", Some(fixup.format()?)),
            ValueTemplate::float(BATTERY_CHANNEL, "%", Some(range_format(0.0, 100.0)?)),
        ];
        Ok(Self {
            core: NodeCore::new(id, name, scheduler),
            driver,
            correction,
            curve,
            fixup,
            values,
        })
    }

    pub fn from_config(config: &BatteryConfig, driver: D) -> Result<Self> {
        Self::new(
            &config.node_id,
            &config.name,
            driver,
            config.correction,
            ChargeCurve {
                empty_volts: config.empty_volts,
                full_volts: config.full_volts,
            },
            config.full_scale_volts,
            SamplingScheduler::new(config.read_interval_ms, config.send_interval_ms),
        )
    }

    /// Last valid corrected voltage.
    pub fn voltage(&self) -> Option<f32> {
        self.core.instances().first().and_then(SensorInstance::valid_value)
    }

    /// Charge level derived from [`Self::voltage`].
    pub fn battery_level(&self) -> Option<f32> {
        self.voltage().map(|v| self.curve.level(v))
    }

    pub fn instances(&self) -> &[SensorInstance] {
        self.core.instances()
    }
}

impl<D: SensorDriver, P: PublishPort> SensorNode<P> for BatteryNode<D> {
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
        let mut pass = BatteryPass {
            node_id,
            driver: &mut self.driver,
            correction: self.correction,
            curve: self.curve,
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

struct BatteryPass<'a, D, P> {
    node_id: &'a str,
    driver: &'a mut D,
    correction: f32,
    curve: ChargeCurve,
    fixup: &'a RangeFixup,
    instances: &'a mut [SensorInstance],
    publisher: &'a mut P,
}

impl<D: SensorDriver, P: PublishPort> SamplingDelegate for BatteryPass<'_, D, P> {
    fn measure(&mut self, _now: Tick) {
        for instance in self.instances.iter_mut().filter(|i| i.is_present()) {
            let volts = self.driver.read_raw(instance.index) * self.correction;
            let reading = self.fixup.fix(instance.index, volts);
            instance.apply(&reading);
            debug!("{}: {} V {:?}", self.node_id, reading.value, instance.validity);
        }
    }

    fn has_valid_reading(&self) -> bool {
        self.instances.iter().any(SensorInstance::is_valid)
    }

    fn publish(&mut self, _now: Tick) {
        for instance in self.instances.iter() {
            send_status(self.publisher, self.node_id, instance);
            let Some(volts) = instance.valid_value() else {
                continue;
            };
            if let Some(channel) = instance.value_channel(SLOT_VOLTAGE) {
                send_float(self.publisher, self.node_id, channel, volts);
            }
            if let Some(channel) = instance.value_channel(SLOT_LEVEL) {
                send_float(self.publisher, self.node_id, channel, self.curve.level(volts));
            }
        }
    }
}
