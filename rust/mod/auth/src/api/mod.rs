mod accounts;
mod me;
mod oauth_sessions;


use std::sync::Arc;

use axum::Router;

use isahub_core::{Actor, CurrentActor, ServiceError};

use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the auth API router.
///
/// Paths are absolute. The caller is expected to wrap the merged router
/// with the authentication layer so handlers see the [`Actor`].
pub fn build_router(svc: Arc<AuthService>) -> Router {
    Router::new()
        .merge(accounts::routes())
        .merge(me::routes())
        .merge(oauth_sessions::routes())
        .with_state(svc)
}

/// Logged-in administrator, or the matching error.
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
