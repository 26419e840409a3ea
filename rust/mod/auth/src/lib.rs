//! Auth module: accounts, bearer tokens and the OAuth session registry.
//!
//! # Resources
//!
//! - **Account**: a logged-in identity (`/users`)
//! - **OauthSession**: tokens held for an account by an external
//!   provider (`/users/{id}/oauth_sessions`), visible to the owner only
//!
//! # Usage
//!
//! ```ignore
//! use auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(sql, AuthConfig::default())?;
//! let authenticator: Arc<dyn Authenticator> = module.service().clone();
//! let router = module.routes();
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use isahub_core::{Module, ServiceError};
use isahub_sql::SQLStore;

use crate::service::{AuthConfig, AuthService};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    pub fn new(sql: Arc<dyn SQLStore>, config: AuthConfig) -> Result<Self, ServiceError> {
        let service = AuthService::new(sql, config).map_err(ServiceError::from)?;
        Ok(Self { service })
    }

    /// The underlying service, also the request [`isahub_core::Authenticator`].
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
