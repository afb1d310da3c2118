//! Fuzz harness for behave plain logs.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let log = featsync_report::parse_plain_log(&input);
    assert!(log.results.len() <= log.lines.len());
});
