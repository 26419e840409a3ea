mod investigations;
mod projects;
mod publish;
mod studies;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::Router;

use isahub_core::{Actor, CurrentActor, ServiceError};

use crate::service::IsaService;

/// Shared application state.
pub type AppState = Arc<IsaService>;

/// Build the ISA API router. Paths are absolute.
pub fn build_router(svc: Arc<IsaService>) -> Router {
    Router::new()
        .merge(projects::routes())
        .merge(investigations::routes())
        .merge(studies::routes())
        .merge(publish::routes())
        .with_state(svc)
}

pub(crate) fn require_admin(actor: CurrentActor) -> Result<Actor, ServiceError> {
    let actor = actor.require()?;
    if !actor.admin {
        return Err(ServiceError::PermissionDenied(format!(
            "{} is not an administrator",
            actor.id
        )));
    }
    Ok(actor)
}
