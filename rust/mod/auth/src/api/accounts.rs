use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use isahub_core::{CurrentActor, ListParams, ServiceError};
use isahub_jsonapi::{Document, serialize, serialize_collection};

use crate::api::{AppState, require_admin};
use crate::model::{CreateAccount, TokenResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_accounts).post(create_account))
        .route("/users/{id}", get(get_account))
        .route("/users/{id}/token", post(mint_token))
}

/// GET /users (admin)
async fn list_accounts(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<ListParams>,
) -> Result<Document, ServiceError> {
    require_admin(actor)?;
    let page = svc.list_accounts(&params)?;
    Ok(serialize_collection(&page.items, page.total))
}

/// POST /users (admin)
async fn create_account(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Json(input): Json<CreateAccount>,
) -> Result<(StatusCode, Document), ServiceError> {
    require_admin(actor)?;
    let account = svc.create_account(input)?;
    Ok((StatusCode::CREATED, serialize(&account)))
}

/// GET /users/{id}
async fn get_account(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Document, ServiceError> {
    actor.require()?;
    let account = svc.get_account(&id)?;
    Ok(serialize(&account))
}

/// POST /users/{id}/token (admin): mint a bearer token for an account.
async fn mint_token(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let admin = require_admin(actor)?;
    let account = svc.get_account(&id)?;
    let token = svc.issue_token(&account)?;
    tracing::info!(account = %account.id, by = %admin.id, "token minted by admin");
    Ok(Json(token))
}
