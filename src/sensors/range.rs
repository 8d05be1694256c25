//! Range fix-up: clamp or invalidate a raw reading.
//!
//! A raw value equal to the family's disconnect sentinel (or NaN) is marked
//! disconnected and left untouched.  Anything else is clamped into
//! `[min, max]`; out-of-range values are never dropped.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, SensorFault};
use crate::sensors::Validity;
use crate::sensors::channel::{ChannelFormat, range_format};

/// Which measurement units a node reports in.  Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// °C, metres.
    #[default]
    Metric,
    /// °F, feet.
    Imperial,
}

/// Result of fixing up one raw reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub instance_index: usize,
    /// Value as returned by the driver.
    pub raw_value: f32,
    /// Clamped value; equals `raw_value` when the sentinel was detected.
    pub value: f32,
    pub sentinel_detected: bool,
}

impl Reading {
    pub fn validity(&self) -> Validity {
        if self.sentinel_detected {
            Validity::Disconnected
        } else {
            Validity::Valid
        }
    }

    /// True when the raw value had to be clamped.
    pub fn clamped(&self) -> bool {
        !self.sentinel_detected && self.value != self.raw_value
    }
}

/// Sentinel and bounds for one unit system of one sensor family.
/// Bounds are ordered and finite once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFixup {
    sentinel: Option<f32>,
    min: f32,
    max: f32,
}

impl RangeFixup {
    pub fn new(sentinel: Option<f32>, min: f32, max: f32) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(Error::InvalidBounds("bound is not finite"));
        }
        if min > max {
            return Err(Error::InvalidBounds("min above max"));
        }
        Ok(Self { sentinel, min, max })
    }

    pub fn sentinel(&self) -> Option<f32> {
        self.sentinel
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn fix(&self, instance_index: usize, raw: f32) -> Reading {
        let sentinel_detected = raw.is_nan() || self.sentinel == Some(raw);
        let value = if sentinel_detected {
            raw
        } else {
            raw.clamp(self.min, self.max)
        };
        let reading = Reading {
            instance_index,
            raw_value: raw,
            value,
            sentinel_detected,
        };
        if reading.clamped() {
            debug!(
                "sensor {}: {} ({} clamped to {})",
                instance_index,
                SensorFault::OutOfRange,
                raw,
                value
            );
        }
        reading
    }

    /// Declared range for the value channel, e.g. `"-55.0:125.0"`.
    pub fn format(&self) -> Result<ChannelFormat> {
        range_format(self.min, self.max)
    }
}
