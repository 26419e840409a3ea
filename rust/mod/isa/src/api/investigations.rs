use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};

use isahub_core::{CurrentActor, ListParams, ServiceError};
use isahub_jsonapi::{Document, serialize, serialize_collection};

use crate::api::AppState;
use crate::export::{RO_BUNDLE_CONTENT_TYPE, bundle_filename};
use crate::model::{InvestigationFilter, InvestigationForm, InvestigationInput};
use crate::service::investigation::InvestigationView;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/investigations",
            get(list_investigations).post(create_investigation),
        )
        .route("/investigations/new", get(new_form))
        .route(
            "/investigations/{id}",
            get(get_investigation)
                .put(update_investigation)
                .delete(destroy_investigation),
        )
        .route("/investigations/{id}/edit", get(edit_form))
        .route("/investigations/{id}/new_based_on", get(new_based_on))
        .route("/investigations/{id}/ro", get(export_ro))
        .route(
            "/programmes/{id}/investigations",
            get(list_programme_investigations),
        )
}

fn document(view: InvestigationView) -> Document {
    serialize(&view.investigation)
        .with_meta("can_edit", view.can_edit)
        .with_meta("can_delete", view.can_delete)
}

async fn list_investigations(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Query(filter): Query<InvestigationFilter>,
    Query(params): Query<ListParams>,
) -> Result<Document, ServiceError> {
    let page = svc.list_investigations(actor.actor(), &filter, &params)?;
    Ok(serialize_collection(&page.items, page.total))
}

/// GET /programmes/{id}/investigations
async fn list_programme_investigations(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Document, ServiceError> {
    svc.get_programme(&id)?;
    let filter = InvestigationFilter {
        project: None,
        programme: Some(id),
    };
    let page = svc.list_investigations(actor.actor(), &filter, &params)?;
    Ok(serialize_collection(&page.items, page.total))
}

async fn create_investigation(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Json(input): Json<InvestigationInput>,
) -> Result<(StatusCode, Document), ServiceError> {
    let inv = svc.create_investigation(actor.actor(), input)?;
    Ok((StatusCode::CREATED, serialize(&inv)))
}

async fn get_investigation(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Document, ServiceError> {
    let view = svc.get_investigation(actor.actor(), &id)?;
    Ok(document(view))
}

async fn update_investigation(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(input): Json<InvestigationInput>,
) -> Result<Document, ServiceError> {
    svc.update_investigation(actor.actor(), &id, input)?;
    let view = svc.get_investigation(actor.actor(), &id)?;
    Ok(document(view))
}

/// DELETE /investigations/{id}: 303 to the listing.
async fn destroy_investigation(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Redirect, ServiceError> {
    svc.destroy_investigation(actor.actor(), &id)?;
    Ok(Redirect::to("/investigations"))
}

async fn new_form(
    State(svc): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<InvestigationForm>, ServiceError> {
    Ok(Json(svc.new_investigation_form(actor.actor())?))
}

async fn edit_form(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<InvestigationForm>, ServiceError> {
    Ok(Json(svc.edit_investigation_form(actor.actor(), &id)?))
}

async fn new_based_on(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<InvestigationForm>, ServiceError> {
    Ok(Json(svc.clone_as_new(actor.actor(), &id)?))
}

/// GET /investigations/{id}/ro: Research Object bundle download.
async fn export_ro(
    State(svc): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let (inv, bundle) = svc.export_ro(actor.actor(), &id)?;
    let disposition = format!("attachment; filename=\"{}\"", bundle_filename(&inv.id));
    Ok((
        [
            (header::CONTENT_TYPE, RO_BUNDLE_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bundle,
    )
        .into_response())
}
