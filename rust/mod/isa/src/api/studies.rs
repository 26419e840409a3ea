use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use isahub_core::{CurrentActor, ServiceError};
use isahub_jsonapi::{Document, serialize, serialize_collection};

use crate::api::AppState;
use crate::model::CreateStudy;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/investigations/{id}/studies",
            get(list_studies).post(create_study),
        )
        .route("/studies/{id}", delete(delete_study))
}

async fn list_studies(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Document, ServiceError> {
    let studies = svc.list_studies(actor.actor(), &id)?;
    Ok(serialize_collection(&studies, studies.len()))
}

async fn create_study(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(input): Json<CreateStudy>,
) -> Result<(StatusCode, Document), ServiceError> {
    let study = svc.create_study(actor.actor(), &id, input)?;
    Ok((StatusCode::CREATED, serialize(&study)))
}

async fn delete_study(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_study(actor.actor(), &id)?;
    Ok(StatusCode::NO_CONTENT)
}
