//! Sensor subsystem: shared node machinery and the per-family nodes.
//!
//! | Module        | Role                                              |
//! |---------------|---------------------------------------------------|
//! | `channel`     | channel descriptors and the naming rule           |
//! | `range`       | sentinel detection and clamping                   |
//! | `change_gate` | threshold change detection                        |
//! | `enumerate`   | setup-time instance discovery and registration    |
//! | `node`        | lifecycle hooks, error escalation, send helpers   |
//! | `temperature` | one-wire probe node (multi-instance capable)      |
//! | `distance`    | ultrasonic echo ranger node                       |
//! | `battery`     | ADC supply voltage node                           |
//!
//! Each node owns a fixed set of [`SensorInstance`]s created once during
//! setup and never resized afterwards.

pub mod battery;
pub mod change_gate;
pub mod channel;
pub mod distance;
pub mod enumerate;
pub mod node;
pub mod range;
pub mod temperature;

use channel::{ChannelName, SensorAddress};
use range::Reading;

use crate::error::{Error, Result};

/// Most value channels a single instance can carry.
pub const MAX_VALUE_CHANNELS: usize = 4;

/// What is known about an instance's latest reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Disconnected,
    /// Never read, or the sensor is absent.
    Unknown,
}

/// One physically discovered sensor under a node, or the single synthetic
/// stand-in registered when discovery found nothing.
#[derive(Debug, Clone)]
pub struct SensorInstance {
    pub index: usize,
    /// Hardware address or positional suffix; `None` in single-instance mode.
    pub identifier: Option<SensorAddress>,
    pub last_value: f32,
    pub validity: Validity,
    pub status_channel: ChannelName,
    /// One name per value template of the node, in template order.
    pub value_channels: heapless::Vec<ChannelName, MAX_VALUE_CHANNELS>,
    present: bool,
}

impl SensorInstance {
    pub fn new(index: usize, identifier: Option<SensorAddress>, status_channel: ChannelName) -> Self {
        Self {
            index,
            identifier,
            last_value: f32::NAN,
            validity: Validity::Unknown,
            status_channel,
            value_channels: heapless::Vec::new(),
            present: true,
        }
    }

    /// The stand-in for a node whose driver reported zero sensors.
    /// It has no value channels and stays `Unknown` for its lifetime.
    pub fn absent(status_channel: ChannelName) -> Self {
        Self {
            present: false,
            ..Self::new(0, None, status_channel)
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// Last value if the latest reading was valid.
    pub fn valid_value(&self) -> Option<f32> {
        self.is_valid().then_some(self.last_value)
    }

    pub fn add_value_channel(&mut self, name: ChannelName) -> Result<()> {
        self.value_channels
            .push(name)
            .map_err(|_| Error::ChannelName("value channel list"))
    }

    /// Name of the value channel stamped from template `slot`.
    pub fn value_channel(&self, slot: usize) -> Option<&str> {
        self.value_channels.get(slot).map(ChannelName::as_str)
    }

    /// Record a measurement.  A disconnected reading keeps the previous value.
    pub fn apply(&mut self, reading: &Reading) {
        self.validity = reading.validity();
        if self.validity == Validity::Valid {
            self.last_value = reading.value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel::bounded;
    use range::RangeFixup;

    fn instance() -> SensorInstance {
        SensorInstance::new(0, None, bounded("status", "test").unwrap())
    }

    #[test]
    fn new_instance_is_unknown() {
        let inst = instance();
        assert_eq!(inst.validity, Validity::Unknown);
        assert!(inst.is_present());
        assert_eq!(inst.valid_value(), None);
    }

    #[test]
    fn disconnected_reading_keeps_previous_value() {
        let fixup = RangeFixup::new(Some(-127.0), -55.0, 125.0).unwrap();
        let mut inst = instance();

        inst.apply(&fixup.fix(0, 21.0));
        assert_eq!(inst.valid_value(), Some(21.0));

        inst.apply(&fixup.fix(0, -127.0));
        assert_eq!(inst.validity, Validity::Disconnected);
        assert_eq!(inst.last_value, 21.0);
        assert_eq!(inst.valid_value(), None);
    }

    #[test]
    fn absent_instance_has_no_value_channels() {
        let inst = SensorInstance::absent(bounded("status", "test").unwrap());
        assert!(!inst.is_present());
        assert!(inst.value_channels.is_empty());
        assert_eq!(inst.value_channel(0), None);
    }
}
