//! Hardware adapters: bridge real peripherals to [`SensorDriver`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: the battery is read via the ADC1 oneshot API and the ranger
//! via the trigger GPIO and the echo ISR (both initialised by `hw_init`).
//! On host/test: readings come from static atomics set with the `sim_set_*`
//! functions.

use core::sync::atomic::AtomicU32;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use log::{debug, info};

use crate::app::ports::SensorDriver;
use crate::drivers::hw_init::RangerPins;
use crate::sensors::channel::SensorAddress;

#[cfg(target_os = "espidf")]
use crate::drivers::{echo::{EchoCapture, MAX_ECHO_US}, hw_init};
#[cfg(target_os = "espidf")]
use crate::pins;

/// Injected pin voltage in millivolts; `u32::MAX` simulates a failed read.
static SIM_BATTERY_MV: AtomicU32 = AtomicU32::new(3_000);
/// Injected echo time; 0 simulates no echo.
static SIM_ECHO_US: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_millivolts(mv: u32) {
    SIM_BATTERY_MV.store(mv, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_echo_us(us: u32) {
    SIM_ECHO_US.store(us, Ordering::Relaxed);
}

// ── Battery ADC ───────────────────────────────────────────────

/// Battery divider tap on ADC1.  Reports pin volts, NaN on a failed read.
pub struct BatteryAdc {
    channel: u32,
}

impl BatteryAdc {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    #[cfg(target_os = "espidf")]
    fn read_volts(&self) -> f32 {
        match hw_init::adc1_read(self.channel) {
            Some(raw) => raw as f32 / pins::ADC_MAX_RAW * pins::ADC_FULL_SCALE_V,
            None => f32::NAN,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_volts(&self) -> f32 {
        match SIM_BATTERY_MV.load(Ordering::Relaxed) {
            u32::MAX => f32::NAN,
            mv => mv as f32 / 1000.0,
        }
    }
}

impl SensorDriver for BatteryAdc {
    fn begin(&mut self) {
        info!("BatteryAdc: ADC1 channel {}", self.channel);
    }

    fn count(&mut self) -> usize {
        1
    }

    fn address(&mut self, _index: usize) -> Option<SensorAddress> {
        None
    }

    fn read_raw(&mut self, _index: usize) -> f32 {
        self.read_volts()
    }
}

// ── Echo ranger ───────────────────────────────────────────────

/// Ultrasonic ranger on a trigger/echo pin pair.  Reports the echo time in
/// microseconds, 0 when no echo came back in time.
pub struct EchoRanger {
    pins: RangerPins,
}

impl EchoRanger {
    pub fn new(pins: RangerPins) -> Self {
        Self { pins }
    }

    /// One ping, blocking for at most one echo timeout.
    #[cfg(target_os = "espidf")]
    fn ping(&self) -> u32 {
        EchoCapture::arm();
        hw_init::gpio_write(self.pins.trigger, false);
        hw_init::delay_us(2);
        hw_init::gpio_write(self.pins.trigger, true);
        hw_init::delay_us(pins::RANGER_TRIGGER_US);
        hw_init::gpio_write(self.pins.trigger, false);

        let start = hw_init::now_us();
        // Allow for the sensor's burst before the echo line rises.
        while hw_init::now_us().wrapping_sub(start) < 2 * MAX_ECHO_US {
            if let Some(width) = EchoCapture::take() {
                return if width <= MAX_ECHO_US { width } else { 0 };
            }
            hw_init::delay_us(50);
        }
        EchoCapture::cancel();
        0
    }

    #[cfg(not(target_os = "espidf"))]
    fn ping(&self) -> u32 {
        SIM_ECHO_US.load(Ordering::Relaxed)
    }
}

impl SensorDriver for EchoRanger {
    fn begin(&mut self) {
        if self.pins.fitted() {
            info!(
                "EchoRanger: trigger GPIO {}, echo GPIO {}",
                self.pins.trigger, self.pins.echo
            );
        } else {
            info!("EchoRanger: pins not set, no ranger fitted");
        }
    }

    fn count(&mut self) -> usize {
        usize::from(self.pins.fitted())
    }

    fn address(&mut self, _index: usize) -> Option<SensorAddress> {
        None
    }

    fn read_raw(&mut self, _index: usize) -> f32 {
        let echo_us = self.ping();
        debug!("EchoRanger: echo {} µs", echo_us);
        echo_us as f32
    }
}
