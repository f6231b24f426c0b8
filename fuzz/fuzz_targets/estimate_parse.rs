#![no_main]

use libfuzzer_sys::fuzz_target;
use todo_sync_extractor::parse_estimate_hours;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Some(hours) = parse_estimate_hours(&raw) {
        assert!(hours >= 0.0);
    }
});
