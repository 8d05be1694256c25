//! Fuzz target: JSON config import
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use telenode::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = core::str::from_utf8(data) {
        if let Ok(config) = SystemConfig::from_json(text) {
            assert!(config.validate().is_ok());
        }
    }
});
