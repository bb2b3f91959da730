#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // URL parsing must not panic on any input.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = review_coverage::host::ChangeLocation::parse(s);
        let _ = review_coverage::host::parse_project_from_path(s);
    }
});
