//! ISR-timed echo pulse capture for the ultrasonic ranger.
//!
//! ## Hardware
//!
//! The ranger raises its echo pin for as long as the sound takes to travel
//! out and back.  The echo GPIO fires on both edges; the ISR stamps the
//! rising edge and turns the falling edge into a pulse width.  The main
//! loop arms a capture, fires the trigger, then polls [`EchoCapture::take`].
//!
//! ```text
//!  Idle ──arm()──▶ Armed ──rise──▶ High ──fall──▶ Done ──take()──▶ Idle
//! ```
//!
//! Edges outside an armed capture are ignored.

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// Longest echo worth waiting for (≈ 4.3 m at 20 °C).
pub const MAX_ECHO_US: u32 = 25_000;

const IDLE: u8 = 0;
const ARMED: u8 = 1;
const HIGH: u8 = 2;
const DONE: u8 = 3;

static ECHO_STATE: AtomicU8 = AtomicU8::new(IDLE);
/// Rising-edge timestamp (microseconds since boot, truncated to u32).
static ECHO_RISE_US: AtomicU32 = AtomicU32::new(0);
static ECHO_WIDTH_US: AtomicU32 = AtomicU32::new(0);

/// ISR handler: register this on the echo GPIO for both edges.
/// Safe to call from interrupt context (lock-free atomics only).
pub fn echo_isr_handler(level_high: bool, now_us: u32) {
    if level_high {
        if ECHO_STATE
            .compare_exchange(ARMED, HIGH, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            ECHO_RISE_US.store(now_us, Ordering::Release);
        }
    } else if ECHO_STATE.load(Ordering::Acquire) == HIGH {
        let rise = ECHO_RISE_US.load(Ordering::Acquire);
        ECHO_WIDTH_US.store(now_us.wrapping_sub(rise), Ordering::Release);
        ECHO_STATE.store(DONE, Ordering::Release);
    }
}

/// Main-loop side of the capture.
pub struct EchoCapture;

impl EchoCapture {
    /// Discard any previous capture and wait for the next rising edge.
    pub fn arm() {
        ECHO_WIDTH_US.store(0, Ordering::Relaxed);
        ECHO_STATE.store(ARMED, Ordering::Release);
    }

    /// Pulse width of a completed capture.  Completes the capture.
    pub fn take() -> Option<u32> {
        ECHO_STATE
            .compare_exchange(DONE, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ECHO_WIDTH_US.load(Ordering::Acquire))
    }

    /// Give up on a capture that timed out.
    pub fn cancel() {
        ECHO_STATE.store(IDLE, Ordering::Release);
    }
}
