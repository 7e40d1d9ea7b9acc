//! Fuzz target: control-route query decoding
//!
//! Feeds arbitrary request targets through `split_target` and
//! `parse_query` and asserts the decoder never panics and never yields
//! more pairs than there are `&`-separated segments.
//!
//! cargo fuzz run fuzz_query_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaynode::http::{parse_query, split_target};

fuzz_target!(|data: &[u8]| {
    let Ok(uri) = core::str::from_utf8(data) else {
        return;
    };
    let (_path, query) = split_target(uri);
    let pairs = parse_query(query);
    assert!(pairs.len() <= query.split('&').count());
});
