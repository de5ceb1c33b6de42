//! Guest cart cookie provisioning.
//!
//! Every browser gets a `sessionCartId` cookie so anonymous carts have a key
//! before anyone signs in.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use prostore_core::CartId;

use super::cookies;
use crate::models::session::cookie_names;

/// Ensure the request carries a guest cart id.
///
/// With a `sessionCartId` cookie present the request passes through
/// untouched. Otherwise a fresh random id is added to the forwarded request's
/// cookies (so handlers see it) and set on the response.
pub async fn guest_cart_middleware(mut request: Request, next: Next) -> Response {
    let existing = cookies::find_cookie(request.headers(), cookie_names::SESSION_CART_ID)
        .filter(|id| !id.is_empty());
    if existing.is_some() {
        return next.run(request).await;
    }

    let cart_id = CartId::new().to_string();
    let cookie = cookies::cart_cookie(&cart_id);

    if let Ok(value) = axum::http::HeaderValue::from_str(&format!(
        "{}={cart_id}",
        cookie_names::SESSION_CART_ID
    )) {
        request.headers_mut().append(header::COOKIE, value);
    }

    tracing::debug!(cart_id = %cart_id, "Issued guest cart id");

    let mut response = next.run(request).await;
    if let Some(value) = cookies::to_header_value(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// The guest cart id from the request's cookies.
///
/// Behind [`guest_cart_middleware`] this is always present; elsewhere it may
/// be `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestCart(pub Option<String>);

impl<S> FromRequestParts<S> for GuestCart
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(cookies::find_cookie(
            &parts.headers,
            cookie_names::SESSION_CART_ID,
        )))
    }
}
