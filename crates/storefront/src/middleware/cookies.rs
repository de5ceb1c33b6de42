//! Cookie parsing and `Set-Cookie` construction.

use axum::http::{HeaderMap, HeaderValue, header};
use cookie::{Cookie, SameSite};

use crate::models::session::cookie_names;

/// Value of the first cookie named `name` across all `Cookie` headers.
#[must_use]
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// The session token cookie.
#[must_use]
pub fn session_cookie(token: &str, max_age: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((cookie_names::SESSION_TOKEN, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(cookie::time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// A cookie that removes the session token.
#[must_use]
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((cookie_names::SESSION_TOKEN, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

/// The anonymous cart cookie. No explicit expiry.
#[must_use]
pub fn cart_cookie(cart_id: &str) -> Cookie<'static> {
    Cookie::build((cookie_names::SESSION_CART_ID, cart_id.to_string()))
        .path("/")
        .build()
}

/// Render a cookie as a `Set-Cookie` header value.
///
/// Cookie names and values here are ASCII, so this only fails on a
/// malformed token; such cookies are dropped.
#[must_use]
pub fn to_header_value(cookie: &Cookie<'_>) -> Option<HeaderValue> {
    HeaderValue::from_str(&cookie.to_string()).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers.append(header::COOKIE, HeaderValue::from_static("sessionCartId=abc"));

        assert_eq!(find_cookie(&headers, "b").as_deref(), Some("2"));
        assert_eq!(find_cookie(&headers, "sessionCartId").as_deref(), Some("abc"));
        assert_eq!(find_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", chrono::Duration::days(30), true).to_string();
        assert!(cookie.starts_with("session-token=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age=2592000"));
    }

    #[test]
    fn test_cleared_cookie_expires() {
        let cookie = cleared_session_cookie(false).to_string();
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_cart_cookie_has_no_expiry() {
        let cookie = cart_cookie("xyz").to_string();
        assert_eq!(cookie, "sessionCartId=xyz; Path=/");
    }
}
