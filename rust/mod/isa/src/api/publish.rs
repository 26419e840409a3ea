use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use isahub_core::{CurrentActor, ServiceError};
use isahub_jsonapi::{Document, serialize, serialize_collection};

use crate::api::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/publish_requests", get(list_requests))
        .route("/investigations/{id}/publish_decision", post(decide))
}

#[derive(Debug, Deserialize)]
struct Decision {
    approve: bool,
}

/// GET /publish_requests: requests waiting for the caller as gatekeeper.
async fn list_requests(
    State(svc): State<AppState>,
    actor: CurrentActor,
) -> Result<Document, ServiceError> {
    let actor = actor.require()?;
    let requests = svc.list_publish_requests(&actor)?;
    Ok(serialize_collection(&requests, requests.len()))
}

/// POST /investigations/{id}/publish_decision
async fn decide(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(decision): Json<Decision>,
) -> Result<Document, ServiceError> {
    let inv = svc.decide_publish(actor.actor(), &id, decision.approve)?;
    Ok(serialize(&inv))
}
