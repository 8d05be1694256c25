//! Fuzz target: persisted config blob decoder
//!
//! Feeds arbitrary bytes to `decode_config` and verifies:
//! - No panics under arbitrary byte inputs
//! - Anything that decodes also passes validation and re-encodes
//!   to a blob that decodes again
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use telenode::adapters::nvs::{decode_config, encode_config};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = decode_config(data) {
        assert!(config.validate().is_ok());
        let bytes = encode_config(&config).expect("valid config must encode");
        assert!(decode_config(&bytes).is_ok());
    }
});
