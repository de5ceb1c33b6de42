//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Guest cart cookie
//! 4. Rate limiting (governor) on credential and session API routes
//!
//! Session extractors live in [`auth`].

pub mod auth;
pub mod cookies;
pub mod guest_cart;
pub mod rate_limit;

pub use auth::{AuthRejection, OptionalSession, RequireClaims, RequireSession, sign_in_url};
pub use guest_cart::{GuestCart, guest_cart_middleware};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
