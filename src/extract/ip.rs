//! Client IP resolution from proxy and CDN headers.
//!
//! # Security Warning: IP Spoofing Risk
//!
//! These headers are client-controlled unless the service sits behind a
//! trusted proxy that overwrites them. The resolved IP is forwarded upstream
//! as an attribution signal only - it is never used for access control, and
//! no format validation is performed on it.

use axum::http::HeaderMap;

use super::header_str;

/// CDN-forwarded connecting IP (Cloudflare).
pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";

/// Hosting-platform client connection IP (Netlify).
pub const NF_CLIENT_CONNECTION_IP: &str = "x-nf-client-connection-ip";

/// Standard forwarded-for header. Format: "client, proxy1, proxy2".
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Alternative single-IP header set by some proxies.
pub const X_REAL_IP: &str = "x-real-ip";

/// Resolve the best-guess client IP from the request headers.
///
/// # Header Priority
///
/// Checks in order (first present and non-empty wins):
///
/// 1. `cf-connecting-ip`
/// 2. `x-nf-client-connection-ip`
/// 3. `x-forwarded-for` - only the first comma-separated entry, trimmed
///    (leftmost = original client in a proxy chain)
/// 4. `x-real-ip`
///
/// Returns `None` when no header carries an IP; the caller falls back to an
/// explicit `client_ip_address` field in the event payload.
#[inline]
pub fn resolve_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(ip) = non_empty(headers, CF_CONNECTING_IP) {
        return Some(ip.to_string());
    }

    if let Some(ip) = non_empty(headers, NF_CLIENT_CONNECTION_IP) {
        return Some(ip.to_string());
    }

    if let Some(forwarded) = non_empty(headers, X_FORWARDED_FOR)
        && let Some(first) = forwarded.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }

    if let Some(ip) = non_empty(headers, X_REAL_IP) {
        return Some(ip.to_string());
    }

    None
}

#[inline]
fn non_empty<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header_str(headers, name).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_cdn_header_wins_over_forwarded_for() {
        let headers = headers(&[
            ("cf-connecting-ip", "1.1.1.1"),
            ("x-forwarded-for", "2.2.2.2, 3.3.3.3"),
        ]);

        assert_eq!(resolve_client_ip(&headers), Some("1.1.1.1".to_string()));
    }

    #[test]
    fn test_platform_header_beats_forwarded_for() {
        let headers = headers(&[
            ("x-nf-client-connection-ip", "10.1.2.3"),
            ("x-forwarded-for", "2.2.2.2"),
            ("x-real-ip", "4.4.4.4"),
        ]);

        assert_eq!(resolve_client_ip(&headers), Some("10.1.2.3".to_string()));
    }

    #[test]
    fn test_forwarded_for_takes_first_entry_trimmed() {
        let headers = headers(&[("x-forwarded-for", "  2.2.2.2  , 3.3.3.3")]);

        assert_eq!(resolve_client_ip(&headers), Some("2.2.2.2".to_string()));
    }

    #[test]
    fn test_forwarded_for_single_entry() {
        let headers = headers(&[("x-forwarded-for", "203.0.113.50")]);

        assert_eq!(
            resolve_client_ip(&headers),
            Some("203.0.113.50".to_string())
        );
    }

    #[test]
    fn test_real_ip_is_last_resort() {
        let headers = headers(&[("x-real-ip", "192.168.1.1")]);

        assert_eq!(resolve_client_ip(&headers), Some("192.168.1.1".to_string()));
    }

    #[test]
    fn test_no_headers_resolves_to_none() {
        assert_eq!(resolve_client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_empty_header_falls_through() {
        let headers = headers(&[
            ("cf-connecting-ip", ""),
            ("x-forwarded-for", "2.2.2.2, 3.3.3.3"),
        ]);

        assert_eq!(resolve_client_ip(&headers), Some("2.2.2.2".to_string()));
    }

    #[test]
    fn test_whitespace_only_forwarded_for_is_none() {
        let headers = headers(&[("x-forwarded-for", "   ")]);

        assert_eq!(resolve_client_ip(&headers), None);
    }

    #[test]
    fn test_ipv6_passes_through() {
        let headers = headers(&[("x-forwarded-for", "2001:db8::1, 10.0.0.1")]);

        assert_eq!(resolve_client_ip(&headers), Some("2001:db8::1".to_string()));
    }

    #[test]
    fn test_garbage_is_passed_through_unvalidated() {
        // Best-effort signal: no IP format validation is performed
        let headers = headers(&[("x-real-ip", "not-an-ip")]);

        assert_eq!(resolve_client_ip(&headers), Some("not-an-ip".to_string()));
    }

    #[test]
    fn test_case_insensitive_header_names() {
        let mut map = HeaderMap::new();
        map.insert("CF-Connecting-IP", HeaderValue::from_static("1.1.1.1"));

        assert_eq!(resolve_client_ip(&map), Some("1.1.1.1".to_string()));
    }
}
