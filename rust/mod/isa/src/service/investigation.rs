use isahub_core::{Actor, ListParams, ListResult, new_id, now_rfc3339};
use isahub_sql::{Statement, Value};

use crate::model::{
    Action, FormFields, Investigation, InvestigationFilter, InvestigationForm, InvestigationInput,
    Policy, Study,
};
use crate::policy::{authorize, can_perform};
use crate::service::{IsaError, IsaService};

/// An investigation together with what the caller may do with it.
#[derive(Debug, Clone)]
pub struct InvestigationView {
    pub investigation: Investigation,
    pub can_edit: bool,
    /// False while studies exist, whatever the policy says.
    pub can_delete: bool,
}

fn login_required(actor: Option<&Actor>) -> Result<&Actor, IsaError> {
    actor.ok_or_else(|| IsaError::Unauthorized("login required".into()))
}

/// Trimmed, non-blank text or `None`.
fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Project ids with duplicates removed, first occurrence wins.
fn distinct(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

impl IsaService {
    fn validate_investigation(&self, title: &str, project_ids: &[String]) -> Result<(), IsaError> {
        let mut errors = Vec::new();
        if title.trim().is_empty() {
            errors.push("title can't be blank".to_string());
        }
        if project_ids.is_empty() {
            errors.push("must belong to at least one project".to_string());
        }
        for id in project_ids {
            match self.get_project(id) {
                Ok(_) => {}
                Err(IsaError::NotFound(_)) => errors.push(format!("project '{}' does not exist", id)),
                Err(e) => return Err(e),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(IsaError::Invalid(errors))
        }
    }

    /// Load an investigation without any permission check.
    pub fn get_investigation_record(&self, id: &str) -> Result<Investigation, IsaError> {
        self.get_record("investigations", id).map_err(|e| match e {
            IsaError::NotFound(_) => IsaError::NotFound(format!("investigation '{}' not found", id)),
            other => other,
        })
    }

    pub(crate) fn investigation_update_statement(&self, inv: &Investigation) -> Result<Statement, IsaError> {
        Self::update_statement(
            "investigations",
            &inv.id,
            inv,
            &[
                ("title", Value::Text(inv.title.clone())),
                ("contributor_id", Value::Text(inv.contributor_id.clone())),
                (
                    "access_type",
                    Value::Text(inv.policy.access_type.as_str().to_string()),
                ),
                ("updated_at", Value::Text(inv.updated_at.clone())),
            ],
        )
    }

    fn project_link_statements(inv: &Investigation) -> Vec<Statement> {
        inv.project_ids
            .iter()
            .map(|pid| {
                Statement::new(
                    "INSERT INTO investigation_projects (investigation_id, project_id) VALUES (?1, ?2)",
                    vec![Value::Text(inv.id.clone()), Value::Text(pid.clone())],
                )
            })
            .collect()
    }

    /// Create an investigation owned by the caller.
    ///
    /// The record, its project links, its publish log and any
    /// notifications are written in one transaction. Notifications are
    /// delivered after commit.
    pub fn create_investigation(
        &self,
        actor: Option<&Actor>,
        input: InvestigationInput,
    ) -> Result<Investigation, IsaError> {
        let actor = login_required(actor)?;

        let title = input.title.unwrap_or_default().trim().to_string();
        let project_ids = distinct(input.project_ids.unwrap_or_default());
        self.validate_investigation(&title, &project_ids)?;

        let id = new_id();
        let requested = input.policy.unwrap_or_default();
        let plan = self.plan_publish(
            actor,
            &id,
            &project_ids,
            Policy::default().access_type,
            requested.access_type,
        )?;

        let now = now_rfc3339();
        let inv = Investigation {
            id: id.clone(),
            title,
            description: non_blank(input.description),
            project_ids,
            contributor_id: actor.id.clone(),
            creator_ids: input.creator_ids.unwrap_or_default(),
            other_creators: non_blank(input.other_creators),
            policy: Policy {
                access_type: plan.applied,
                permissions: requested.permissions,
            },
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let mut stmts = vec![Self::insert_statement(
            "investigations",
            &inv.id,
            &inv,
            &[
                ("title", Value::Text(inv.title.clone())),
                ("contributor_id", Value::Text(inv.contributor_id.clone())),
                (
                    "access_type",
                    Value::Text(inv.policy.access_type.as_str().to_string()),
                ),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?];
        stmts.extend(Self::project_link_statements(&inv));
        stmts.extend(plan.statements()?);
        self.sql.exec_batch(&stmts)?;

        tracing::info!(
            investigation = %inv.id,
            contributor = %actor.id,
            access = inv.policy.access_type.as_str(),
            held = plan.is_held(),
            "investigation created"
        );
        self.deliver(&plan.notifications);
        Ok(inv)
    }

    /// Read an investigation the caller may view.
    pub fn get_investigation(&self, actor: Option<&Actor>, id: &str) -> Result<InvestigationView, IsaError> {
        let inv = self.get_investigation_record(id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &inv, Action::View)?;

        let can_edit = can_perform(&subject, &inv, Action::Edit);
        let can_delete = can_perform(&subject, &inv, Action::Delete) && self.study_count(&inv.id)? == 0;
        Ok(InvestigationView {
            investigation: inv,
            can_edit,
            can_delete,
        })
    }

    /// Investigations the caller may view, newest first.
    pub fn list_investigations(
        &self,
        actor: Option<&Actor>,
        filter: &InvestigationFilter,
        params: &ListParams,
    ) -> Result<ListResult<Investigation>, IsaError> {
        let mut clauses = Vec::new();
        let mut args = Vec::new();
        if let Some(ref project) = filter.project {
            args.push(Value::Text(project.clone()));
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM investigation_projects ip
                         WHERE ip.investigation_id = i.id AND ip.project_id = ?{})",
                args.len()
            ));
        }
        if let Some(ref programme) = filter.programme {
            args.push(Value::Text(programme.clone()));
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM investigation_projects ip
                         JOIN projects p ON p.id = ip.project_id
                         WHERE ip.investigation_id = i.id AND p.programme_id = ?{})",
                args.len()
            ));
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT i.data FROM investigations i{} ORDER BY i.created_at DESC, i.rowid DESC",
            where_sql
        );

        let subject = self.subject(actor)?;
        let visible: Vec<Investigation> = self
            .query_records::<Investigation>(&sql, &args)?
            .into_iter()
            .filter(|inv| can_perform(&subject, inv, Action::View))
            .collect();
        Ok(params.page(visible))
    }

    /// Update attributes, creators and policy of an investigation.
    ///
    /// Needs `Edit`; a changed policy additionally needs `Manage`. A
    /// widened public tier goes through the publish workflow.
    pub fn update_investigation(
        &self,
        actor: Option<&Actor>,
        id: &str,
        input: InvestigationInput,
    ) -> Result<Investigation, IsaError> {
        let current = self.get_investigation_record(id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &current, Action::Edit)?;
        // While a request waits, the tier the form carries is the requested one.
        let intended = self
            .pending_request(&current.id)?
            .map(|log| log.requested_access)
            .unwrap_or(current.policy.access_type);
        let policy_changed = input.policy.as_ref().is_some_and(|p| {
            p.access_type != intended || p.permissions != current.policy.permissions
        });
        if policy_changed {
            authorize(&subject, &current, Action::Manage)?;
        }
        let actor = login_required(actor)?;

        let mut inv = current.clone();
        if let Some(title) = input.title {
            inv.title = title.trim().to_string();
        }
        if input.description.is_some() {
            inv.description = non_blank(input.description);
        }
        if input.other_creators.is_some() {
            inv.other_creators = non_blank(input.other_creators);
        }
        if let Some(creators) = input.creator_ids {
            inv.creator_ids = creators;
        }
        let projects_changed = match input.project_ids {
            Some(ids) => {
                inv.project_ids = distinct(ids);
                inv.project_ids != current.project_ids
            }
            None => false,
        };
        self.validate_investigation(&inv.title, &inv.project_ids)?;

        let plan = match input.policy {
            Some(requested) if policy_changed => {
                let plan = self.plan_publish(
                    actor,
                    &inv.id,
                    &inv.project_ids,
                    current.policy.access_type,
                    requested.access_type,
                )?;
                inv.policy = Policy {
                    access_type: plan.applied,
                    permissions: requested.permissions,
                };
                Some(plan)
            }
            _ => None,
        };
        inv.updated_at = now_rfc3339();

        let mut stmts = vec![self.investigation_update_statement(&inv)?];
        if projects_changed {
            stmts.push(Statement::new(
                "DELETE FROM investigation_projects WHERE investigation_id = ?1",
                vec![Value::Text(inv.id.clone())],
            ));
            stmts.extend(Self::project_link_statements(&inv));
        }
        if let Some(ref plan) = plan {
            stmts.extend(plan.statements()?);
        }
        self.sql.exec_batch(&stmts)?;

        tracing::info!(
            investigation = %inv.id,
            actor = %actor.id,
            access = inv.policy.access_type.as_str(),
            held = plan.as_ref().is_some_and(|p| p.is_held()),
            "investigation updated"
        );
        if let Some(plan) = plan {
            self.deliver(&plan.notifications);
        }
        Ok(inv)
    }

    /// Delete an investigation without studies.
    pub fn destroy_investigation(&self, actor: Option<&Actor>, id: &str) -> Result<(), IsaError> {
        let inv = self.get_investigation_record(id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &inv, Action::Delete)?;

        let studies = self.study_count(&inv.id)?;
        if studies > 0 {
            return Err(IsaError::Conflict(format!(
                "investigation '{}' still has {} studies and cannot be deleted",
                inv.id, studies
            )));
        }

        // Guarded in the statement so a concurrently added study wins.
        let affected = self.sql.exec(
            "DELETE FROM investigations WHERE id = ?1
             AND NOT EXISTS (SELECT 1 FROM studies WHERE investigation_id = ?1)",
            &[Value::Text(inv.id.clone())],
        )?;
        if affected == 0 {
            return Err(IsaError::Conflict(format!(
                "investigation '{}' gained a study and cannot be deleted",
                inv.id
            )));
        }

        tracing::info!(investigation = %inv.id, actor = subject.id().unwrap_or("anonymous"), "investigation deleted");
        Ok(())
    }

    /// Empty creation form.
    pub fn new_investigation_form(&self, actor: Option<&Actor>) -> Result<InvestigationForm, IsaError> {
        login_required(actor)?;
        Ok(InvestigationForm {
            action: "/investigations".into(),
            method: "POST",
            investigation: FormFields::default(),
        })
    }

    /// Edit form prefilled with the current attributes.
    pub fn edit_investigation_form(&self, actor: Option<&Actor>, id: &str) -> Result<InvestigationForm, IsaError> {
        let inv = self.get_investigation_record(id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &inv, Action::Edit)?;
        Ok(InvestigationForm {
            action: format!("/investigations/{}", inv.id),
            method: "PUT",
            investigation: FormFields::from(&inv),
        })
    }

    /// Creation form prefilled from an existing investigation. Nothing is
    /// saved.
    ///
    /// Anonymous callers are sent to log in even when the source is
    /// publicly visible.
    pub fn clone_as_new(&self, actor: Option<&Actor>, id: &str) -> Result<InvestigationForm, IsaError> {
        let inv = self.get_investigation_record(id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &inv, Action::View)?;
        login_required(actor)?;
        Ok(InvestigationForm {
            action: "/investigations".into(),
            method: "POST",
            investigation: FormFields::from(&inv),
        })
    }

    /// Research Object bundle of an investigation and its studies.
    pub fn export_ro(&self, actor: Option<&Actor>, id: &str) -> Result<(Investigation, Vec<u8>), IsaError> {
        let inv = self.get_investigation_record(id)?;
        let subject = self.subject(actor)?;
        authorize(&subject, &inv, Action::Download)?;

        let exporter = self
            .exporter
            .as_ref()
            .ok_or_else(|| IsaError::NotFound("research object export is not available".into()))?;
        let studies: Vec<Study> = self.studies_of(&inv.id)?;
        let bundle = exporter
            .export(&inv, &studies)
            .map_err(|e| IsaError::Internal(e.to_string()))?;
        tracing::info!(investigation = %inv.id, bytes = bundle.len(), "research object exported");
        Ok((inv, bundle))
    }

    /// Number of investigations, for any caller.
    pub fn investigation_count(&self) -> Result<usize, IsaError> {
        self.count("SELECT COUNT(*) AS cnt FROM investigations", &[])
    }
}
