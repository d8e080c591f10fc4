//! Fuzz target: stored config decoding
//!
//! Writes arbitrary bytes where the postcard `ToyConfig` blob lives and
//! loads it back.  Checks:
//! - No panics on garbage
//! - Anything `load` accepts passes validation and survives a save/load
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use cattoy::adapters::nvs::NvsAdapter;
use cattoy::app::ports::{ConfigPort, StoragePort};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    if nvs.write("cattoy", "toycfg", data).is_err() {
        return;
    }

    if let Ok(cfg) = nvs.load() {
        assert!(cfg.validate().is_ok());
        nvs.save(&cfg).expect("valid config must save");
        assert_eq!(nvs.load().expect("saved config must load"), cfg);
    }
});
