//! Root login endpoint: verifies the password against the argon2id hash
//! and issues a bearer token.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use auth::model::TokenResponse;
use auth::service::token::ROOT_ACCOUNT_ID;
use isahub_core::ServiceError;

use crate::bootstrap::verify_root_password;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// POST /auth/login. Only root logs in with a password; accounts get
/// tokens minted by an administrator.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    if body.username != ROOT_ACCOUNT_ID
        || !verify_root_password(&body.password, &state.server_config.root.password_hash)
    {
        tracing::warn!(username = %body.username, "login rejected");
        return Err(ServiceError::Unauthorized("invalid credentials".into()));
    }
    let token = state.auth.issue_root_token()?;
    tracing::info!("root logged in");
    Ok(Json(token))
}
