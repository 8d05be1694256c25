//! System configuration parameters
//!
//! All tunable parameters for a telenode board.
//! Values can be overridden via NVS (non-volatile storage) or a JSON
//! provisioning document.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;
use crate::sensors::channel::{InstanceMode, MAX_CHANNEL_NAME};
use crate::sensors::range::UnitSystem;

/// Shortest cadence any node accepts.
pub const MIN_INTERVAL_MS: u32 = 100;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Pause between driver-loop ticks (milliseconds)
    pub loop_interval_ms: u32,
    /// Units every node reports in
    pub units: UnitSystem,

    pub temperature: TemperatureConfig,
    pub distance: DistanceConfig,
    pub battery: BatteryConfig,
}

/// One-wire temperature probes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureConfig {
    pub enabled: bool,
    pub node_id: String,
    pub name: String,
    pub measurement_interval_ms: u32,
    pub publish_interval_ms: u32,
    /// Expose every probe on the bus instead of the first one only
    pub mode: InstanceMode,
}

/// Ultrasonic echo ranger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceConfig {
    pub enabled: bool,
    pub node_id: String,
    pub name: String,
    pub measurement_interval_ms: u32,
    pub publish_interval_ms: u32,
    /// Closest distance reported (metres)
    pub min_distance_m: f32,
    /// Farthest distance reported (metres)
    pub max_distance_m: f32,
    /// Smallest move that counts as an obstacle change (metres)
    pub min_change_m: f32,
    /// Air temperature used for the speed of sound (Celsius)
    pub ambient_temperature_c: f32,
    /// GPIO numbers; -1 leaves the ranger unpopulated
    pub trigger_pin: i32,
    pub echo_pin: i32,
}

/// ADC supply monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    pub enabled: bool,
    pub node_id: String,
    pub name: String,
    pub read_interval_ms: u32,
    pub send_interval_ms: u32,
    /// Multiplier applied to the pin voltage (divider ratio, calibration)
    pub correction: f32,
    /// Voltage reported as 0 %
    pub empty_volts: f32,
    /// Voltage reported as 100 %
    pub full_volts: f32,
    /// Upper bound of the voltage channel
    pub full_scale_volts: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 50, // 20 Hz
            units: UnitSystem::Metric,
            temperature: TemperatureConfig::default(),
            distance: DistanceConfig::default(),
            battery: BatteryConfig::default(),
        }
    }
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            // No one-wire driver on the reference board
            enabled: false,
            node_id: "temperature".into(),
            name: "Temperature".into(),
            measurement_interval_ms: 300_000,
            publish_interval_ms: 300_000,
            mode: InstanceMode::Single,
        }
    }
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            node_id: "distance".into(),
            name: "Distance".into(),
            measurement_interval_ms: 1_000,
            publish_interval_ms: 5_000,
            min_distance_m: 0.02,
            max_distance_m: 3.0,
            min_change_m: 0.1,
            ambient_temperature_c: 20.0,
            trigger_pin: pins::RANGER_TRIGGER_GPIO,
            echo_pin: pins::RANGER_ECHO_GPIO,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            node_id: "battery".into(),
            name: "Battery".into(),
            read_interval_ms: 10_000,  // 10 s
            send_interval_ms: 300_000, // 5 min
            correction: 1.0,
            empty_volts: 2.6,
            full_volts: 3.3,
            full_scale_volts: 3.3,
        }
    }
}

impl SystemConfig {
    /// Parse a provisioning document and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no node can run with.  NaN fails every bound.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms"));
        }

        let t = &self.temperature;
        check_identity(&t.node_id, &t.name, "temperature.node_id")?;
        check_cadence(
            t.measurement_interval_ms,
            t.publish_interval_ms,
            "temperature.measurement_interval_ms",
            "temperature.publish_interval_ms",
        )?;

        let d = &self.distance;
        check_identity(&d.node_id, &d.name, "distance.node_id")?;
        check_cadence(
            d.measurement_interval_ms,
            d.publish_interval_ms,
            "distance.measurement_interval_ms",
            "distance.publish_interval_ms",
        )?;
        if !(d.min_distance_m >= 0.0) {
            return Err(ConfigError::ValidationFailed("distance.min_distance_m"));
        }
        if !(d.max_distance_m > d.min_distance_m) {
            return Err(ConfigError::ValidationFailed("distance.max_distance_m"));
        }
        if !(d.min_change_m >= 0.0) {
            return Err(ConfigError::ValidationFailed("distance.min_change_m"));
        }
        // Speed of sound must stay positive: 331.4 + 0.6 T > 0
        if !(-273.0..=100.0).contains(&d.ambient_temperature_c) {
            return Err(ConfigError::ValidationFailed("distance.ambient_temperature_c"));
        }

        let b = &self.battery;
        check_identity(&b.node_id, &b.name, "battery.node_id")?;
        check_cadence(
            b.read_interval_ms,
            b.send_interval_ms,
            "battery.read_interval_ms",
            "battery.send_interval_ms",
        )?;
        if !(b.correction > 0.0) {
            return Err(ConfigError::ValidationFailed("battery.correction"));
        }
        if !(b.full_volts > b.empty_volts) {
            return Err(ConfigError::ValidationFailed("battery.full_volts"));
        }
        if !(b.full_scale_volts > 0.0) {
            return Err(ConfigError::ValidationFailed("battery.full_scale_volts"));
        }

        Ok(())
    }
}

fn check_identity(node_id: &str, name: &str, field: &'static str) -> Result<(), ConfigError> {
    if node_id.is_empty() || node_id.len() > MAX_CHANNEL_NAME || name.is_empty() {
        return Err(ConfigError::ValidationFailed(field));
    }
    Ok(())
}

fn check_cadence(
    measurement_ms: u32,
    publish_ms: u32,
    measurement_field: &'static str,
    publish_field: &'static str,
) -> Result<(), ConfigError> {
    if measurement_ms < MIN_INTERVAL_MS {
        return Err(ConfigError::ValidationFailed(measurement_field));
    }
    if publish_ms < MIN_INTERVAL_MS {
        return Err(ConfigError::ValidationFailed(publish_field));
    }
    if publish_ms < measurement_ms {
        warn!(
            "Config: {} ({}ms) shorter than {} ({}ms), republishing stale values",
            publish_field, publish_ms, measurement_field, measurement_ms
        );
    }
    Ok(())
}
