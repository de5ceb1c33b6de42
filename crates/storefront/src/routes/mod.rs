//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                     - Home page
//! GET  /health               - Liveness check
//! GET  /health/ready         - Readiness check (database)
//!
//! # Auth
//! GET  /sign-in              - Sign-in page (?callbackUrl=)
//! POST /sign-in              - Sign-in action (rate limited)
//! GET  /sign-up              - Sign-up page
//! POST /sign-up              - Sign-up action (rate limited)
//! POST /sign-out             - Sign-out action
//!
//! # Session API
//! GET  /api/session          - Current session as JSON
//! POST /api/session/update   - Change display name
//!
//! # Orders (requires session)
//! GET  /order/{id}           - Order detail with payment options
//! ```
//!
//! Every route sits behind the guest cart middleware.

pub mod auth;
pub mod health;
pub mod home;
pub mod orders;
pub mod session;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{api_rate_limiter, auth_rate_limiter, guest_cart_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sign-in",
            get(auth::sign_in_page).merge(post(auth::sign_in).layer(auth_rate_limiter())),
        )
        .route(
            "/sign-up",
            get(auth::sign_up_page).merge(post(auth::sign_up).layer(auth_rate_limiter())),
        )
        .route("/sign-out", post(auth::sign_out))
}

/// Create the session API routes router.
pub fn session_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(session::current))
        .route("/update", post(session::update))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .nest("/api/session", session_api_routes())
        .route("/order/{id}", get(orders::show))
}

/// The full application: routes, state, guest cart and request tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(middleware::from_fn(guest_cart_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
