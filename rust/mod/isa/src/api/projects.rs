use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use isahub_core::{CurrentActor, ServiceError};
use isahub_jsonapi::{Document, serialize, serialize_collection};

use crate::api::{AppState, require_admin};
use crate::model::{AddMember, CreateProgramme, CreateProject, Membership};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/programmes", get(list_programmes).post(create_programme))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/{id}/members", post(add_member))
}

async fn list_programmes(
    State(svc): State<AppState>,
    actor: CurrentActor,
) -> Result<Document, ServiceError> {
    actor.require()?;
    let programmes = svc.list_programmes()?;
    Ok(serialize_collection(&programmes, programmes.len()))
}

async fn create_programme(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Json(input): Json<CreateProgramme>,
) -> Result<(StatusCode, Document), ServiceError> {
    require_admin(actor)?;
    let programme = svc.create_programme(input)?;
    Ok((StatusCode::CREATED, serialize(&programme)))
}

async fn list_projects(
    State(svc): State<AppState>,
    actor: CurrentActor,
) -> Result<Document, ServiceError> {
    actor.require()?;
    let projects = svc.list_projects()?;
    Ok(serialize_collection(&projects, projects.len()))
}

async fn create_project(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Json(input): Json<CreateProject>,
) -> Result<(StatusCode, Document), ServiceError> {
    require_admin(actor)?;
    let project = svc.create_project(input)?;
    Ok((StatusCode::CREATED, serialize(&project)))
}

async fn add_member(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(input): Json<AddMember>,
) -> Result<(StatusCode, Json<Membership>), ServiceError> {
    require_admin(actor)?;
    let membership = svc.add_member(&id, input)?;
    Ok((StatusCode::CREATED, Json(membership)))
}
