pub mod schema;
pub mod project;
pub mod investigation;
pub mod publish;
pub mod study;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use isahub_core::Actor;
use isahub_sql::{Row, SQLError, SQLStore, Statement, Value};

use crate::export::BundleExporter;
use crate::mailer::Mailer;
use crate::model::AccessType;
use crate::policy::Subject;

/// ISA service error type.
#[derive(Debug, Error)]
pub enum IsaError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Submitted attributes failed validation; one message per problem.
    #[error("invalid: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<IsaError> for isahub_core::ServiceError {
    fn from(e: IsaError) -> Self {
        use isahub_core::ServiceError;
        match e {
            IsaError::NotFound(m) => ServiceError::NotFound(m),
            IsaError::Conflict(m) => ServiceError::Conflict(m),
            IsaError::Invalid(errors) => ServiceError::Validation(errors.join("; ")),
            IsaError::Unauthorized(m) => ServiceError::Unauthorized(m),
            IsaError::Forbidden(m) => ServiceError::PermissionDenied(m),
            IsaError::Storage(m) => ServiceError::Storage(m),
            IsaError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

impl From<SQLError> for IsaError {
    fn from(e: SQLError) -> Self {
        if e.is_unique_violation() {
            IsaError::Conflict(e.to_string())
        } else if e.is_foreign_key_violation() {
            IsaError::NotFound(e.to_string())
        } else {
            IsaError::Storage(e.to_string())
        }
    }
}

/// Groups of public tiers that count as the same level of exposure.
///
/// Widening the public tier into a different class needs gatekeeper
/// approval. A tier missing from every class forms a class of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEquivalence {
    pub classes: Vec<Vec<AccessType>>,
}

impl Default for TierEquivalence {
    fn default() -> Self {
        Self {
            classes: vec![
                vec![AccessType::Private],
                vec![
                    AccessType::Visible,
                    AccessType::Accessible,
                    AccessType::Editing,
                    AccessType::Managing,
                ],
            ],
        }
    }
}

impl TierEquivalence {
    pub fn same_class(&self, a: AccessType, b: AccessType) -> bool {
        a == b
            || self
                .classes
                .iter()
                .any(|class| class.contains(&a) && class.contains(&b))
    }

    /// Whether moving the public tier from `from` to `to` is a widening
    /// that needs approval.
    pub fn requires_approval(&self, from: AccessType, to: AccessType) -> bool {
        to > from && !self.same_class(from, to)
    }

    /// Reject tables that list a tier in more than one class.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = Vec::new();
        for tier in self.classes.iter().flatten() {
            if seen.contains(tier) {
                return Err(format!(
                    "tier '{}' appears in more than one class",
                    tier.as_str()
                ));
            }
            seen.push(*tier);
        }
        Ok(())
    }
}

/// Configuration for the ISA service.
#[derive(Debug, Clone, Default)]
pub struct IsaConfig {
    pub tiers: TierEquivalence,
}

/// The ISA service: projects, investigations, studies and publishing.
pub struct IsaService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) config: IsaConfig,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) exporter: Option<Arc<dyn BundleExporter>>,
}

impl IsaService {
    /// Create a new IsaService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: IsaConfig,
        mailer: Arc<dyn Mailer>,
        exporter: Option<Arc<dyn BundleExporter>>,
    ) -> Result<Arc<Self>, IsaError> {
        config.tiers.validate().map_err(|e| IsaError::Invalid(vec![e]))?;
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self {
            sql,
            config,
            mailer,
            exporter,
        }))
    }

    /// Resolve the caller to a policy [`Subject`], loading memberships.
    pub fn subject(&self, actor: Option<&Actor>) -> Result<Subject, IsaError> {
        match actor {
            None => Ok(Subject::anonymous()),
            Some(actor) => {
                let projects = self.projects_of(&actor.id)?;
                Ok(Subject::new(actor.clone(), projects))
            }
        }
    }

    // ── Record helpers ──

    /// INSERT of a JSON record plus its indexed columns.
    pub(crate) fn insert_statement<T: Serialize>(
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<Statement, IsaError> {
        let json = serde_json::to_string(record).map_err(|e| IsaError::Internal(e.to_string()))?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            cols.push(col);
            placeholders.push(format!("?{}", i + 3));
            params.push(val.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", "),
        );
        Ok(Statement::new(sql, params))
    }

    /// UPDATE of a JSON record and its indexed columns.
    pub(crate) fn update_statement<T: Serialize>(
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<Statement, IsaError> {
        let json = serde_json::to_string(record).map_err(|e| IsaError::Internal(e.to_string()))?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params = vec![Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            sets.push(format!("{} = ?{}", col, i + 2));
            params.push(val.clone());
        }

        let id_idx = params.len() + 1;
        params.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            sets.join(", "),
            id_idx,
        );
        Ok(Statement::new(sql, params))
    }

    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), IsaError> {
        let stmt = Self::insert_statement(table, id, record, indexes)?;
        self.sql.exec(&stmt.sql, &stmt.params)?;
        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, IsaError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let rows = self.sql.query(&sql, &[Value::Text(id.to_string())])?;
        let row = rows
            .first()
            .ok_or_else(|| IsaError::NotFound(format!("{}/{}", table, id)))?;
        decode(row)
    }

    /// Run a `SELECT data ...` query and decode every row.
    pub(crate) fn query_records<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, IsaError> {
        self.sql.query(sql, params)?.iter().map(decode).collect()
    }

    /// Run a `SELECT COUNT(*) AS cnt ...` query.
    pub(crate) fn count(&self, sql: &str, params: &[Value]) -> Result<usize, IsaError> {
        Ok(self
            .sql
            .query(sql, params)?
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize)
    }
}

fn decode<T: DeserializeOwned>(row: &Row) -> Result<T, IsaError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| IsaError::Internal("missing data column".into()))?;
    serde_json::from_str(data).map_err(|e| IsaError::Internal(e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use isahub_core::Actor;
    use isahub_sql::SqliteStore;

    use super::{IsaConfig, IsaService};
    use crate::export::{BundleExporter, ExportError};
    use crate::mailer::{MailError, Mailer};
    use crate::model::{
        AddMember, CreateProject, Investigation, InvestigationInput, Notification, Policy,
        Project, ProjectRole, Study,
    };

    /// Keeps every notification it is asked to send.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<Notification>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Mailer for RecordingMailer {
        fn send(&self, notification: &Notification) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError("smtp down".into()));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    pub struct FixedExporter;

    impl BundleExporter for FixedExporter {
        fn export(&self, inv: &Investigation, studies: &[Study]) -> Result<Vec<u8>, ExportError> {
            Ok(format!("PK:{}:{}", inv.id, studies.len()).into_bytes())
        }
    }

    pub struct Fixture {
        pub svc: Arc<IsaService>,
        pub mailer: Arc<RecordingMailer>,
    }

    pub fn fixture() -> Fixture {
        fixture_with(false)
    }

    pub fn fixture_with(failing_mailer: bool) -> Fixture {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mailer = Arc::new(RecordingMailer {
            fail: failing_mailer,
            ..Default::default()
        });
        let svc = IsaService::new(
            sql,
            IsaConfig::default(),
            mailer.clone(),
            Some(Arc::new(FixedExporter)),
        )
        .unwrap();
        Fixture { svc, mailer }
    }

    pub fn person(id: &str) -> Actor {
        Actor {
            id: id.into(),
            name: id.into(),
            admin: false,
        }
    }

    pub fn admin() -> Actor {
        Actor {
            id: "root".into(),
            name: "Root".into(),
            admin: true,
        }
    }

    pub fn project(svc: &IsaService, title: &str) -> Project {
        svc.create_project(CreateProject {
            title: title.into(),
            programme_id: None,
        })
        .unwrap()
    }

    pub fn join(svc: &IsaService, project: &Project, account: &str, role: ProjectRole) {
        svc.add_member(
            &project.id,
            AddMember {
                account_id: account.into(),
                role,
            },
        )
        .unwrap();
    }

    pub fn input(title: &str, project: &Project, policy: Policy) -> InvestigationInput {
        InvestigationInput {
            title: Some(title.into()),
            project_ids: Some(vec![project.id.clone()]),
            policy: Some(policy),
            ..Default::default()
        }
    }

    pub fn public(access_type: crate::model::AccessType) -> Policy {
        Policy {
            access_type,
            permissions: vec![],
        }
    }
}
