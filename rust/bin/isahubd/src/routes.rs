//! Route registration: module routes plus system endpoints, all behind
//! the authentication layer.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use auth::service::AuthService;
use isahub_core::{Authenticator, authenticate};

use crate::config::ServerConfig;
use crate::login;

/// Application shared state.
#[derive(Clone)]
pub struct AppState {
    pub server_config: Arc<ServerConfig>,
    pub auth: Arc<AuthService>,
}

/// Build the complete router with all routes.
///
/// Module routes carry absolute paths and are merged, not nested.
pub fn build_router(state: AppState, module_routes: Vec<(&str, Router)>) -> Router {
    let authenticator: Arc<dyn Authenticator> = state.auth.clone();

    let mut app: Router = Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .merge(login::routes())
        .with_state(state);

    for (name, router) in module_routes {
        tracing::debug!(module = name, "mounting routes");
        app = app.merge(router);
    }

    app.layer(middleware::from_fn_with_state(authenticator, authenticate))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "isahubd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
