//! Session extractors.
//!
//! The session is read from the `session-token` cookie on every request and
//! verified with the [`SessionManager`](crate::services::auth::SessionManager)
//! held in [`AppState`].

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use super::cookies;
use crate::models::session::{SessionView, cookie_names};
use crate::services::auth::TokenClaims;
use crate::state::AppState;

/// Path of the sign-in page; also where auth errors are shown.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Sign-in URL that returns to `callback` afterwards.
#[must_use]
pub fn sign_in_url(callback: &str) -> String {
    format!(
        "{SIGN_IN_PATH}?callbackUrl={}",
        urlencoding::encode(callback)
    )
}

fn decode(parts: &Parts, state: &AppState) -> Option<(TokenClaims, SessionView)> {
    let token = cookies::find_cookie(&parts.headers, cookie_names::SESSION_TOKEN)?;
    state.sessions().decode_session(&token)
}

/// Extractor that requires a signed-in user.
///
/// Page requests without a valid session are redirected to the sign-in page
/// with a `callbackUrl`; `/api/` requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSession(session): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", session.user.name)
/// }
/// ```
pub struct RequireSession(pub SessionView);

/// A session together with the claims it was projected from.
///
/// Used where a handler re-issues the token.
pub struct RequireClaims(pub TokenClaims, pub SessionView);

/// Rejection for [`RequireSession`].
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the sign-in page (for HTML requests).
    RedirectToSignIn(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn(callback) => Redirect::to(&sign_in_url(&callback)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl AuthRejection {
    /// Pick the rejection from the URI the client asked for.
    ///
    /// Nested routers see their path with the prefix stripped, so the
    /// original URI is preferred when the router recorded one.
    fn for_request(parts: &Parts) -> Self {
        let uri: &Uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);

        if uri.path().starts_with("/api/") {
            Self::Unauthorized
        } else {
            let callback = uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), ToString::to_string);
            Self::RedirectToSignIn(callback)
        }
    }
}

impl FromRequestParts<AppState> for RequireClaims {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (claims, session) =
            decode(parts, state).ok_or_else(|| AuthRejection::for_request(parts))?;
        Ok(Self(claims, session))
    }
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireClaims(_, session) = RequireClaims::from_request_parts(parts, state).await?;
        Ok(Self(session))
    }
}

/// Extractor that optionally gets the current session.
///
/// Missing, expired and tampered tokens all read as `None`.
pub struct OptionalSession(pub Option<SessionView>);

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(decode(parts, state).map(|(_, session)| session)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn reject(parts: Parts) -> Response {
        AuthRejection::for_request(&parts).into_response()
    }

    fn nested_app() -> Router {
        Router::new()
            .nest("/api/session", Router::new().route("/update", get(reject)))
            .nest("/account", Router::new().route("/orders", get(reject)))
    }

    #[test]
    fn test_sign_in_url_encodes_callback() {
        assert_eq!(
            sign_in_url("/order/abc?x=1"),
            "/sign-in?callbackUrl=%2Forder%2Fabc%3Fx%3D1"
        );
    }

    #[test]
    fn test_rejection_depends_on_path() {
        let (parts, ()) = axum::http::Request::builder()
            .uri("/api/session/update")
            .body(())
            .map(axum::http::Request::into_parts)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            AuthRejection::for_request(&parts),
            AuthRejection::Unauthorized
        ));

        let (parts, ()) = axum::http::Request::builder()
            .uri("/order/42?tab=items")
            .body(())
            .map(axum::http::Request::into_parts)
            .unwrap_or_else(|e| panic!("{e}"));
        match AuthRejection::for_request(&parts) {
            AuthRejection::RedirectToSignIn(callback) => assert_eq!(callback, "/order/42?tab=items"),
            AuthRejection::Unauthorized => panic!("expected redirect"),
        }
    }

    #[test]
    fn test_redirect_response_location() {
        let response = AuthRejection::RedirectToSignIn("/order/1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap_or_else(|| panic!("no location")),
            "/sign-in?callbackUrl=%2Forder%2F1"
        );
    }

    #[tokio::test]
    async fn test_nested_api_route_is_unauthorized() {
        let response = nested_app()
            .oneshot(Request::builder().uri("/api/session/update").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_nested_page_redirect_keeps_full_callback() {
        let response = nested_app()
            .oneshot(Request::builder().uri("/account/orders?page=2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/sign-in?callbackUrl=%2Faccount%2Forders%3Fpage%3D2"
        );
    }
}
