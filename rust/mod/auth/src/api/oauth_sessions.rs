//! Registry of the OAuth sessions an account holds with external
//! providers. Every route is restricted to the account's owner.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::{delete, get};
use axum::{Json, Router};

use isahub_core::{CurrentActor, ServiceError};
use isahub_jsonapi::{Document, serialize, serialize_collection};

use crate::api::AppState;
use crate::model::RecordSession;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{id}/oauth_sessions",
            get(list_sessions).post(record_session),
        )
        .route("/users/{id}/oauth_sessions/{sid}", delete(revoke_session))
}

/// GET /users/{id}/oauth_sessions
async fn list_sessions(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Document, ServiceError> {
    let account = svc.find_and_check_owner(actor.actor(), &id)?;
    let sessions = svc.list_sessions(&account.id)?;
    Ok(serialize_collection(&sessions, sessions.len()))
}

/// POST /users/{id}/oauth_sessions
async fn record_session(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(input): Json<RecordSession>,
) -> Result<(StatusCode, Document), ServiceError> {
    let account = svc.find_and_check_owner(actor.actor(), &id)?;
    let session = svc.record_session(&account.id, input)?;
    Ok((StatusCode::CREATED, serialize(&session)))
}

/// DELETE /users/{id}/oauth_sessions/{sid}: 303 back to the listing,
/// whether or not the session still existed.
async fn revoke_session(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path((id, sid)): Path<(String, String)>,
) -> Result<Redirect, ServiceError> {
    let account = svc.find_and_check_owner(actor.actor(), &id)?;
    svc.revoke_session(&account.id, &sid)?;
    Ok(Redirect::to(&format!("/users/{}/oauth_sessions", account.id)))
}
