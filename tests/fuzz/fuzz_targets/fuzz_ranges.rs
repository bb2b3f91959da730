#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Line decoding must not panic on any JSON input.
    if let Ok(raw) = serde_json::from_slice(data) {
        let _ = review_coverage::ranges::to_ranges(raw);
    }
});
