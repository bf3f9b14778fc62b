//! Request helpers shared by handlers and middleware.

use std::time::Duration;

use axum::http::HeaderMap;

use crate::context::RequestContext;

/// Extract client IP address and user-agent from request headers.
///
/// Tries `x-forwarded-for` first (first hop only), then `x-real-ip`.
pub fn extract_request_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    (ip, user_agent)
}

/// Extract a Bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Build the per-request context: caller info plus the configured timeout.
pub fn request_context(headers: &HeaderMap, timeout: Duration) -> RequestContext {
    let (ip, user_agent) = extract_request_info(headers);
    RequestContext::new()
        .with_timeout(timeout)
        .with_client_info(ip, user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));

        let (ip, ua) = extract_request_info(&headers);
        assert_eq!(ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(ua.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        let (ip, ua) = extract_request_info(&headers);
        assert_eq!(ip.as_deref(), Some("192.168.1.1"));
        assert!(ua.is_none());
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert("Authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_none());
    }
}
