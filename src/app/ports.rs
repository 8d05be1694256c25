//! Port traits: the hexagonal boundary between node logic and the outside world.
//!
//! ```text
//!   SensorDriver ──▶ SensorNode (domain) ──▶ PublishPort
//!                        ▲
//!                    ClockPort
//! ```
//!
//! Driven adapters (sensor buses, the telemetry bus, the system timer,
//! persistent storage) implement these traits.  Nodes consume them via
//! generics, so the domain core never touches hardware directly and tests
//! can substitute a fake for every collaborator.

use crate::config::SystemConfig;
use crate::sensors::channel::{ChannelSpec, SensorAddress};

/// Free-running millisecond tick.  Wraps at `u32::MAX`; always compare
/// ticks through [`crate::scheduler::elapsed`].
pub type Tick = u32;

// ───────────────────────────────────────────────────────────────
// Sensor driver port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One sensor family's hardware driver.
///
/// A driver may front several physical sensors sharing a bus.  Indices are
/// positional in the bus enumeration order, `0..count()`.
pub trait SensorDriver {
    /// Bring the bus up.  Called once from the node's setup hook, before
    /// [`count`](Self::count).
    fn begin(&mut self) {}

    /// Number of physically discovered sensors.  May legitimately be 0.
    fn count(&mut self) -> usize;

    /// Hardware-native identifier of sensor `index`, if the bus has one.
    fn address(&mut self, index: usize) -> Option<SensorAddress>;

    /// Start a conversion on every sensor.  Called once at the start of
    /// each measurement pass.
    fn request_conversion(&mut self) {}

    /// Latest raw reading of sensor `index`, or the family's documented
    /// disconnect sentinel.
    fn read_raw(&mut self, index: usize) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Publish port (driven adapter: domain → telemetry bus)
// ───────────────────────────────────────────────────────────────

/// The telemetry bus as seen by a node.
///
/// Channel names are scoped by `node_id`.  Values are published as text.
pub trait PublishPort {
    /// Register a channel.  Called once per channel during setup.
    fn advertise(&mut self, node_id: &str, spec: &ChannelSpec) -> Result<(), PublishError>;

    /// Whether the bus can currently accept values.  Queried before every send.
    fn is_connected(&self) -> bool;

    /// Publish one value.  Callers check [`is_connected`](Self::is_connected)
    /// first; nothing is buffered or retried.
    fn send(&mut self, node_id: &str, channel: &str, value: &str) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond tick source.
pub trait ClockPort {
    fn now_ms(&self) -> Tick;
}

// ───────────────────────────────────────────────────────────────
// Sampling delegate (decouples the scheduler from node internals)
// ───────────────────────────────────────────────────────────────

/// Callback trait the [`SamplingScheduler`](crate::scheduler::SamplingScheduler)
/// invokes when a cadence fires.
///
/// The scheduler knows nothing about instances, drivers or channels; a node
/// implements this over its own state for the duration of one tick.
pub trait SamplingDelegate {
    /// Measurement pass: read every instance and update its last value.
    fn measure(&mut self, now: Tick);

    /// Whether at least one instance currently holds a valid reading.
    fn has_valid_reading(&self) -> bool;

    /// Publish pass: send status and values for every instance.
    fn publish(&mut self, now: Tick);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] if nothing has been stored yet.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`PublishPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The bus is offline.
    NotConnected,
    /// The bus refused the channel or value.
    Rejected,
    /// A channel with this name is already registered for the node.
    DuplicateChannel,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` names the field.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Rejected => write!(f, "rejected by bus"),
            Self::DuplicateChannel => write!(f, "duplicate channel"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(field) => write!(f, "validation failed: {}", field),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for PublishError {}

impl std::error::Error for ConfigError {}
