//! Sign-in, sign-up and sign-out handlers.
//!
//! Credentials are checked against `storefront.users`; a successful sign-in
//! sets the `session-token` cookie and redirects to the form's `callbackUrl`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;
use serde::Deserialize;
use tracing::instrument;

use crate::db::users::UserRepository;
use crate::error::{AppError, clear_sentry_user, format_error, set_sentry_user};
use crate::filters;
use crate::forms::{SignInForm, SignUpForm, safe_callback};
use crate::middleware::{OptionalSession, cookies};
use crate::models::session::SessionView;
use crate::services::auth::{AuthError, SignedSession};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Query parameters accepted by the auth pages.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
    pub error: Option<String>,
}

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub session: Option<SessionView>,
    pub error: Option<String>,
    pub callback_url: String,
    pub email: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub session: Option<SessionView>,
    pub error: Option<String>,
    pub callback_url: String,
    pub name: String,
    pub email: String,
}

fn with_cookie(mut response: Response, cookie: &Cookie<'_>) -> Response {
    if let Some(value) = cookies::to_header_value(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Redirect to `callback` carrying a fresh session cookie.
fn signed_in_redirect(state: &AppState, signed: &SignedSession, callback: &str) -> Response {
    set_sentry_user(&signed.session.user.id, signed.session.user.email.as_deref());
    let sessions = state.sessions();
    let cookie = cookies::session_cookie(
        &signed.token,
        sessions.codec().max_age(),
        sessions.secure_cookies(),
    );
    with_cookie(Redirect::to(callback).into_response(), &cookie)
}

/// Display the sign-in page. Signed-in users go straight to the callback.
pub async fn sign_in_page(
    OptionalSession(session): OptionalSession,
    Query(query): Query<AuthQuery>,
) -> Response {
    let callback = safe_callback(query.callback_url.as_deref()).to_string();
    if session.is_some() {
        return Redirect::to(&callback).into_response();
    }

    SignInTemplate {
        session,
        error: query.error,
        callback_url: callback,
        email: String::new(),
    }
    .into_response()
}

/// Handle sign-in form submission.
#[instrument(skip_all)]
pub async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let callback = safe_callback(form.callback_url.as_deref()).to_string();

    let rerender = |error: String| {
        SignInTemplate {
            session: None,
            error: Some(error),
            callback_url: callback.clone(),
            email: form.email.clone(),
        }
        .into_response()
    };

    if let Err(errors) = form.validate() {
        return rerender(format_error(&AppError::Validation(errors)));
    }

    let store = UserRepository::new(state.pool());
    match state
        .sessions()
        .sign_in(&store, &form.email, &form.password)
        .await
    {
        Ok(Some(signed)) => signed_in_redirect(&state, &signed, &callback),
        Ok(None) => {
            tracing::info!("Sign-in rejected");
            rerender(INVALID_CREDENTIALS.to_string())
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Display the sign-up page.
pub async fn sign_up_page(
    OptionalSession(session): OptionalSession,
    Query(query): Query<AuthQuery>,
) -> Response {
    let callback = safe_callback(query.callback_url.as_deref()).to_string();
    if session.is_some() {
        return Redirect::to(&callback).into_response();
    }

    SignUpTemplate {
        session,
        error: query.error,
        callback_url: callback,
        name: String::new(),
        email: String::new(),
    }
    .into_response()
}

/// Handle sign-up form submission, then sign the new user in.
#[instrument(skip_all)]
pub async fn sign_up(State(state): State<AppState>, Form(form): Form<SignUpForm>) -> Response {
    let callback = safe_callback(form.callback_url.as_deref()).to_string();

    let rerender = |error: String| {
        SignUpTemplate {
            session: None,
            error: Some(error),
            callback_url: callback.clone(),
            name: form.name.clone(),
            email: form.email.clone(),
        }
        .into_response()
    };

    if let Err(errors) = form.validate() {
        return rerender(format_error(&AppError::Validation(errors)));
    }

    let store = UserRepository::new(state.pool());
    let sessions = state.sessions();

    match sessions
        .register(&store, &form.name, &form.email, &form.password)
        .await
    {
        Ok(_) => {}
        Err(
            e @ (AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_)
            | AuthError::Repository(crate::db::RepositoryError::Conflict { .. })),
        ) => return rerender(format_error(&AppError::Auth(e))),
        Err(e) => return AppError::from(e).into_response(),
    }

    match sessions.sign_in(&store, &form.email, &form.password).await {
        Ok(Some(signed)) => signed_in_redirect(&state, &signed, &callback),
        Ok(None) => rerender(INVALID_CREDENTIALS.to_string()),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Clear the session cookie.
pub async fn sign_out(State(state): State<AppState>) -> Response {
    clear_sentry_user();
    let cookie = cookies::cleared_session_cookie(state.sessions().secure_cookies());
    with_cookie(Redirect::to("/").into_response(), &cookie)
}
