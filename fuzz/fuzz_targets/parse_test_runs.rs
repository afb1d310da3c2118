//! Fuzz harness for Xray test run listings (`testexec/{key}/test?detailed=true`).

#![no_main]

use featsync_ports::{HttpResponse, TestRun};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    let _ = HttpResponse::new(200, body.into_owned()).parse::<Vec<TestRun>>();
});
