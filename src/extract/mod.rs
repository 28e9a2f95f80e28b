//! Extraction of client signals from the inbound request.
//!
//! The relay enriches each event with best-effort signals read from the
//! request itself: the originating IP address, the user agent, and the
//! `_fbp`/`_fbc` browser cookies. None of these are validated - they are
//! attribution hints for the upstream API, not security inputs.

pub mod cookies;
pub mod ip;

use axum::http::HeaderMap;

pub use cookies::parse_cookies;
pub use ip::resolve_client_ip;

/// Look up a request header by name and return its value as a string.
///
/// `HeaderMap` lookups are case-insensitive per HTTP semantics, so a header
/// supplied as `X-Forwarded-For` and one supplied as `x-forwarded-for`
/// resolve identically. Returns `None` for absent headers and for values
/// that are not valid UTF-8.
#[inline]
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Like [`header_str`], but treats an empty value as absent.
///
/// Fallback chains (payload field vs. header vs. cookie) skip empty strings,
/// matching how browsers and proxies that send empty headers are handled.
#[inline]
pub fn non_empty_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header_str(headers, name).filter(|value| !value.is_empty())
}
