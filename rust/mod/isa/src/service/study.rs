use isahub_core::{Actor, new_id, now_rfc3339};
use isahub_sql::Value;

use crate::model::{Action, CreateStudy, Study};
use crate::policy::authorize;
use crate::service::{IsaError, IsaService};

impl IsaService {
    /// Add a study to an investigation the caller may edit.
    pub fn create_study(
        &self,
        actor: Option<&Actor>,
        investigation_id: &str,
        input: CreateStudy,
    ) -> Result<Study, IsaError> {
        let inv = self.get_investigation_record(investigation_id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &inv, Action::Edit)?;
        let actor = actor.ok_or_else(|| IsaError::Unauthorized("login required".into()))?;

        let title = input.title.trim();
        if title.is_empty() {
            return Err(IsaError::Invalid(vec!["title can't be blank".into()]));
        }

        let now = now_rfc3339();
        let study = Study {
            id: new_id(),
            investigation_id: inv.id.clone(),
            title: title.to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            contributor_id: actor.id.clone(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        self.insert_record(
            "studies",
            &study.id,
            &study,
            &[
                ("investigation_id", Value::Text(study.investigation_id.clone())),
                ("title", Value::Text(study.title.clone())),
                ("contributor_id", Value::Text(study.contributor_id.clone())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        tracing::info!(study = %study.id, investigation = %inv.id, "study created");
        Ok(study)
    }

    /// Studies of an investigation the caller may view.
    pub fn list_studies(&self, actor: Option<&Actor>, investigation_id: &str) -> Result<Vec<Study>, IsaError> {
        let inv = self.get_investigation_record(investigation_id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &inv, Action::View)?;
        self.studies_of(&inv.id)
    }

    /// Delete a study. Only its contributor or an administrator may.
    pub fn delete_study(&self, actor: Option<&Actor>, id: &str) -> Result<(), IsaError> {
        let actor = actor.ok_or_else(|| IsaError::Unauthorized("login required".into()))?;
        let study: Study = self.get_record("studies", id).map_err(|e| match e {
            IsaError::NotFound(_) => IsaError::NotFound(format!("study '{}' not found", id)),
            other => other,
        })?;
        if !actor.admin && actor.id != study.contributor_id {
            return Err(IsaError::Forbidden(format!(
                "{} may not delete study '{}'",
                actor.id, study.id
            )));
        }
        self.sql
            .exec("DELETE FROM studies WHERE id = ?1", &[Value::Text(study.id.clone())])?;
        tracing::info!(study = %study.id, investigation = %study.investigation_id, "study deleted");
        Ok(())
    }

    pub(crate) fn studies_of(&self, investigation_id: &str) -> Result<Vec<Study>, IsaError> {
        self.query_records(
            "SELECT data FROM studies WHERE investigation_id = ?1 ORDER BY created_at, rowid",
            &[Value::Text(investigation_id.to_string())],
        )
    }

    pub fn study_count(&self, investigation_id: &str) -> Result<usize, IsaError> {
        self.count(
            "SELECT COUNT(*) AS cnt FROM studies WHERE investigation_id = ?1",
            &[Value::Text(investigation_id.to_string())],
        )
    }
}
