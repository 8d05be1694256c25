//! Hardware initialisation and interrupt-side peripheral helpers.

pub mod echo;
pub mod hw_init;
