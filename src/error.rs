//! Unified error types for the telenode firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! driver loop's error handling uniform.  All variants are `Copy` so they can
//! be passed through setup and logging paths without allocation.
//!
//! Note that sensor conditions are *not* errors: an absent, disconnected or
//! out-of-range sensor is encoded into the published status/value pair and
//! only named here through [`SensorFault`] for logging.

use core::fmt;

use crate::app::ports::{ConfigError, PublishError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The publish adapter rejected an advertisement or a value.
    Publish(PublishError),
    /// A channel name, address or format string does not fit its buffer.
    ChannelName(&'static str),
    /// A lifecycle hook was invoked out of order.
    Lifecycle(&'static str),
    /// Range bounds that cannot be clamped into.
    InvalidBounds(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Publish(e) => write!(f, "publish: {e}"),
            Self::ChannelName(what) => write!(f, "channel name: {what} too long"),
            Self::Lifecycle(msg) => write!(f, "lifecycle: {msg}"),
            Self::InvalidBounds(what) => write!(f, "invalid bounds: {what}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Conditions a node surfaces through its status channel instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// The driver reported zero instances at setup.  Permanent.
    Absent,
    /// A reading matched the disconnect sentinel.  Transient, per instance.
    Disconnected,
    /// A reading fell outside the declared bounds and was clamped.
    OutOfRange,
    /// The publish adapter was offline; the value was dropped.
    PublishSkipped,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "sensor absent"),
            Self::Disconnected => write!(f, "sensor disconnected"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::PublishSkipped => write!(f, "publish skipped"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
