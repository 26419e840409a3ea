use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use isahub_core::{CurrentActor, ServiceError};
use isahub_jsonapi::serialize;

use crate::api::AppState;
use crate::service::token::ROOT_ACCOUNT_ID;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// GET /me: the calling account. Root has no account row and gets its
/// actor back as plain JSON.
async fn me(State(svc): State<AppState>, actor: CurrentActor) -> Result<Response, ServiceError> {
    let actor = actor.require()?;
    if actor.id == ROOT_ACCOUNT_ID {
        return Ok(Json(actor).into_response());
    }
    let account = svc.get_account(&actor.id)?;
    Ok(serialize(&account).into_response())
}
