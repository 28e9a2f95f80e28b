//! Fuzz testing for the cookie parser.
//!
//! The `Cookie` header is fully attacker-controlled, so the parser must
//! never panic and never abort on malformed input:
//!
//! - Arbitrary separators, missing `=`, duplicate names
//! - Invalid percent-encoding (bad cookies are skipped, not fatal)
//! - Non-ASCII and embedded control bytes
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the cookie fuzz target
//! cargo +nightly fuzz run fuzz_cookies
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_cookies -- -max_total_time=60
//! ```

#![no_main]

use capi_relay::extract::parse_cookies;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = std::str::from_utf8(data) {
        let jar = parse_cookies(Some(header));

        // Parsing is lossy but never inventive: every name came from the input
        for name in jar.keys() {
            assert!(header.contains(name));
        }
    }

    // Absent header is always an empty jar
    assert!(parse_cookies(None).is_empty());
});
