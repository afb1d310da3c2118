//! Fuzz harness for configuration files (featsync.yaml)
//!
//! Target: the real `FeatsyncConfig` type, every section defaulted.

#![no_main]

use featsync_config::FeatsyncConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let _: Result<FeatsyncConfig, _> = serde_yaml::from_str(input);
    let _: Result<FeatsyncConfig, _> = serde_json::from_str(input);
});
