//! GPIO / peripheral pin assignments for the telenode reference board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Ranger pins can also be overridden from the
//! stored configuration; -1 marks a peripheral as not fitted.

/// Marks an unpopulated pin.
pub const NOT_CONNECTED: i32 = -1;

// ---------------------------------------------------------------------------
// Battery monitor (resistive divider to ADC1)
// ---------------------------------------------------------------------------

/// Battery divider tap.  ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const BATTERY_ADC_GPIO: i32 = 4;
pub const BATTERY_ADC_CHANNEL: u32 = 3;
/// Full-scale pin voltage at 12 dB attenuation.
pub const ADC_FULL_SCALE_V: f32 = 3.3;
/// 12-bit one-shot conversions.
pub const ADC_MAX_RAW: f32 = 4095.0;

// ---------------------------------------------------------------------------
// Ultrasonic ranger (RCW-0001 / HC-SR04 style)
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a ping.
pub const RANGER_TRIGGER_GPIO: i32 = 5;
/// Digital input: HIGH for the echo round-trip time.  Both edges interrupt.
pub const RANGER_ECHO_GPIO: i32 = 18;
/// Trigger pulse length.
pub const RANGER_TRIGGER_US: u32 = 10;

// ---------------------------------------------------------------------------
// One-wire bus (DS18B20 probes, external driver)
// ---------------------------------------------------------------------------

/// Reserved for the one-wire data line (4.7 kΩ pull-up on the board).
pub const ONE_WIRE_GPIO: i32 = 21;

/// True when `pin` names a fitted GPIO.
pub fn is_connected(pin: i32) -> bool {
    pin > NOT_CONNECTED
}
