//! JSON session endpoints.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::instrument;

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::forms::SessionUpdate;
use crate::middleware::{OptionalSession, RequireClaims, cookies};
use crate::models::session::SessionView;
use crate::services::auth::{ProjectContext, SessionTrigger};
use crate::state::AppState;

/// The current session, or `null` when signed out.
pub async fn current(OptionalSession(session): OptionalSession) -> Json<Option<SessionView>> {
    Json(session)
}

/// Change the display name.
///
/// The new name is stored, the session is projected through the update
/// trigger, and a re-signed token replaces the cookie.
#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn update(
    State(state): State<AppState>,
    RequireClaims(claims, _): RequireClaims,
    Json(body): Json<SessionUpdate>,
) -> Result<Response> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    UserRepository::new(state.pool())
        .update_name(claims.sub, name)
        .await?;

    let sessions = state.sessions();
    let session = sessions.project_session(ProjectContext {
        claims: &claims,
        trigger: Some(SessionTrigger::Update { name }),
    });

    let refreshed = sessions.refresh_claims(&claims, name, Utc::now());
    let signed = sessions.sign(&refreshed)?;
    let cookie = cookies::session_cookie(
        &signed.token,
        sessions.codec().max_age(),
        sessions.secure_cookies(),
    );

    tracing::info!("Display name updated");

    let mut response = Json(session).into_response();
    if let Some(value) = cookies::to_header_value(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}
