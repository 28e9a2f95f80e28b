//! Cookie header parsing.
//!
//! The relay only ever reads two cookies (`_fbp` and `_fbc`), but parsing is
//! generic: the whole `Cookie` header is decoded into a map once per request
//! and discarded afterwards.

use std::collections::HashMap;

/// First-party browser identifier cookie set by the Meta pixel.
pub const FBP_COOKIE: &str = "_fbp";

/// Click identifier cookie set by the Meta pixel on ad-driven visits.
pub const FBC_COOKIE: &str = "_fbc";

/// Parse a raw `Cookie` header value into a name -> decoded value map.
///
/// # Splitting Rules
///
/// - Pairs are separated by `;`.
/// - Each pair is split on the *first* `=` only: cookie values may
///   legitimately contain further `=` characters (base64 fragments).
/// - A segment without `=` maps to the empty string.
/// - Values are percent-decoded; a cookie whose value fails to decode is
///   skipped rather than aborting the request (best-effort extraction).
///
/// An absent header (`None`) yields an empty map.
pub fn parse_cookies(header: Option<&str>) -> HashMap<String, String> {
    let mut jar = HashMap::new();

    let Some(header) = header else {
        return jar;
    };

    for segment in header.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let (name, raw_value) = match segment.split_once('=') {
            Some((name, value)) => (name, value),
            None => (segment, ""),
        };

        match urlencoding::decode(raw_value) {
            Ok(value) => {
                jar.insert(name.to_string(), value.into_owned());
            }
            Err(_) => {
                tracing::debug!(cookie = %name, "Skipping cookie with undecodable value");
            }
        }
    }

    jar
}
