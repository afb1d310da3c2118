//! Fuzz harness for Gherkin parsing and the feature adapter.
//!
//! Any text must either parse or fail as malformed input, and any parsed
//! feature must adapt or be rejected as malformed. Neither may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(feature) = featsync_gherkin::parse(input) {
        let _ = featsync_gherkin::adapt(&feature);
        let _ = featsync_gherkin::render_description(&feature);
        for (_, scenario) in featsync_gherkin::scenarios(&feature) {
            let _ = featsync_gherkin::render_steps(&scenario.steps);
            let _ = featsync_gherkin::render_examples(&scenario.examples);
        }
    }
});
