//! Application core: the driver loop and the port traits it is built on.
//!
//! All interaction with hardware and the telemetry bus happens through
//! **port traits** defined in [`ports`], keeping the node logic fully
//! testable without real peripherals.  [`service::NodeHost`] is the single
//! driver loop that owns every registered node.

pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod mocks;
