//! Authentication seam shared by all modules.
//!
//! Modules never parse credentials themselves. The binary installs
//! [`authenticate`] as a layer with a concrete [`Authenticator`]; the
//! layer resolves the caller to an [`Actor`] and stores it in the
//! request extensions. Handlers read it back with [`CurrentActor`].

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// The logged-in caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Account id (or `root` for the bootstrap superadmin).
    pub id: String,
    /// Display name.
    pub name: String,
    /// System administrators bypass ownership and policy checks.
    #[serde(default)]
    pub admin: bool,
}

/// Pluggable authenticator.
///
/// - `Ok(Some(actor))`: valid credentials.
/// - `Ok(None)`: no credentials at all; the request continues anonymously.
/// - `Err(_)`: credentials were present but invalid.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Option<Actor>, ServiceError>;
}

/// Middleware resolving the caller and storing the [`Actor`] as a request
/// extension. Compose it with `axum::middleware::from_fn_with_state`.
pub async fn authenticate(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if let Some(actor) = authenticator.authenticate(request.headers())? {
        request.extensions_mut().insert(actor);
    }
    Ok(next.run(request).await)
}

/// Extract the Bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Extractor for the (possibly anonymous) caller.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
    /// The actor, or `Unauthorized` for anonymous callers.
    pub fn require(self) -> Result<Actor, ServiceError> {
        self.0
            .ok_or_else(|| ServiceError::Unauthorized("login required".into()))
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentActor(parts.extensions.get::<Actor>().cloned()))
    }
}
