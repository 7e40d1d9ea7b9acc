//! Fuzz target: hub status-line parsing
//!
//! Whatever the hub sends back, `parse_status_code` must not panic and
//! may only ever yield a three-digit code.
//!
//! cargo fuzz run fuzz_hub_reply

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaynode::app::payload::parse_status_code;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let line = text.lines().next().unwrap_or_default();
    if let Some(code) = parse_status_code(line) {
        assert!(code <= 999, "status code wider than three digits");
    }
});
