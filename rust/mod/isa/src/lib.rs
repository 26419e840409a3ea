//! ISA module: projects, investigations, studies and publishing.
//!
//! # Resources
//!
//! - **Programme / Project**: ownership and membership; gatekeepers of a
//!   project approve publication of its content
//! - **Investigation**: `/investigations`, guarded by its sharing policy
//! - **Study**: `/investigations/{id}/studies`; blocks investigation delete
//! - **PublishLog**: `/publish_requests`, tier changes held for approval
//!
//! # Usage
//!
//! ```ignore
//! use isa::{IsaModule, mailer::LogMailer, service::IsaConfig};
//!
//! let module = IsaModule::new(sql, IsaConfig::default(), Arc::new(LogMailer), None)?;
//! let router = module.routes();
//! ```

pub mod api;
pub mod export;
pub mod mailer;
pub mod model;
pub mod policy;
pub mod service;

use std::sync::Arc;

use axum::Router;

use isahub_core::{Module, ServiceError};
use isahub_sql::SQLStore;

use crate::export::BundleExporter;
use crate::mailer::Mailer;
use crate::service::{IsaConfig, IsaService};

/// ISA module implementing the Module trait.
pub struct IsaModule {
    service: Arc<IsaService>,
}

impl IsaModule {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: IsaConfig,
        mailer: Arc<dyn Mailer>,
        exporter: Option<Arc<dyn BundleExporter>>,
    ) -> Result<Self, ServiceError> {
        let service = IsaService::new(sql, config, mailer, exporter)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<IsaService> {
        &self.service
    }
}

impl Module for IsaModule {
    fn name(&self) -> &str {
        "isa"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
