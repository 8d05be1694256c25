//! One-shot hardware peripheral initialization.
//!
//! Configures the battery ADC channel and the ranger's trigger/echo GPIOs
//! using raw ESP-IDF sys calls. Called once from `main()` before the
//! node loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Pins chosen at boot (from config), passed to every init step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangerPins {
    pub trigger: i32,
    pub echo: i32,
}

impl RangerPins {
    pub fn fitted(&self) -> bool {
        crate::pins::is_connected(self.trigger) && crate::pins::is_connected(self.echo)
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(ranger: RangerPins) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the node loop; single-threaded.
    unsafe {
        init_adc()?;
        if ranger.fitted() {
            init_ranger_gpio(ranger)?;
        }
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_ranger: RangerPins) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  No concurrent access is possible because
/// `init_adc()` completes before the node loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::BATTERY_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!(
        "hw_init: ADC1 configured (CH{}=battery, GPIO {})",
        pins::BATTERY_ADC_CHANNEL, pins::BATTERY_ADC_GPIO
    );
    Ok(())
}

/// One raw 12-bit conversion, `None` if the driver reported an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Option<u16> {
    None
}

// ── Ranger GPIO ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ranger_gpio(ranger: RangerPins) -> Result<(), HwInitError> {
    let trigger_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << ranger.trigger,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&trigger_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(ranger.trigger, 0) };

    let echo_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << ranger.echo,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let ret = unsafe { gpio_config(&echo_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!(
        "hw_init: ranger GPIO configured (trigger={}, echo={})",
        ranger.trigger, ranger.echo
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_ranger_gpio(). Main-loop only.
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

/// Busy-wait for `us` microseconds.
#[cfg(target_os = "espidf")]
pub fn delay_us(us: u32) {
    // SAFETY: ROM busy-wait, no shared state.
    unsafe { esp_rom_delay_us(us) };
}

#[cfg(not(target_os = "espidf"))]
pub fn delay_us(_us: u32) {}

/// Microseconds since boot, truncated to u32.
#[cfg(target_os = "espidf")]
pub fn now_us() -> u32 {
    // SAFETY: esp_timer_get_time is a timer counter read.
    (unsafe { esp_timer_get_time() }) as u32
}

#[cfg(not(target_os = "espidf"))]
pub fn now_us() -> u32 {
    0
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::echo::echo_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn echo_gpio_isr(arg: *mut core::ffi::c_void) {
    // The echo pin number travels in the handler argument.
    let pin = arg as usize as i32;
    // SAFETY: gpio_get_level and esp_timer_get_time are register reads;
    // safe in ISR context.
    let high = unsafe { gpio_get_level(pin) } != 0;
    let now_us = (unsafe { esp_timer_get_time() }) as u32;
    echo_isr_handler(high, now_us);
}

/// Install per-pin GPIO ISR service and register the echo handler.
/// Call after init_peripherals() and before the node loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(ranger: RangerPins) -> Result<(), HwInitError> {
    if !ranger.fitted() {
        info!("hw_init: no ranger fitted, ISR service not needed");
        return Ok(());
    }
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). The handler registered
    // below only touches the lock-free echo capture atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(
            ranger.echo,
            Some(echo_gpio_isr),
            ranger.echo as usize as *mut core::ffi::c_void,
        );
        if ret != ESP_OK {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(ranger.echo);

        info!("hw_init: ISR service installed (echo GPIO {})", ranger.echo);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(_ranger: RangerPins) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
