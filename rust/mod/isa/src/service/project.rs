use isahub_core::{new_id, now_rfc3339};
use isahub_sql::Value;

use crate::model::{AddMember, CreateProgramme, CreateProject, Membership, Programme, Project, ProjectRole};
use crate::service::{IsaError, IsaService};

impl IsaService {
    // ── Programmes ──

    pub fn create_programme(&self, input: CreateProgramme) -> Result<Programme, IsaError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(IsaError::Invalid(vec!["title can't be blank".into()]));
        }
        let now = now_rfc3339();
        let programme = Programme {
            id: new_id(),
            title: title.to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        self.insert_record(
            "programmes",
            &programme.id,
            &programme,
            &[
                ("title", Value::Text(programme.title.clone())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        tracing::info!(programme = %programme.id, "programme created");
        Ok(programme)
    }

    pub fn get_programme(&self, id: &str) -> Result<Programme, IsaError> {
        self.get_record("programmes", id)
            .map_err(|e| match e {
                IsaError::NotFound(_) => IsaError::NotFound(format!("programme '{}' not found", id)),
                other => other,
            })
    }

    pub fn list_programmes(&self) -> Result<Vec<Programme>, IsaError> {
        self.query_records("SELECT data FROM programmes ORDER BY title", &[])
    }

    // ── Projects ──

    pub fn create_project(&self, input: CreateProject) -> Result<Project, IsaError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(IsaError::Invalid(vec!["title can't be blank".into()]));
        }
        if let Some(ref programme_id) = input.programme_id {
            self.get_programme(programme_id)?;
        }

        let now = now_rfc3339();
        let project = Project {
            id: new_id(),
            title: title.to_string(),
            programme_id: input.programme_id,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        let programme = match project.programme_id {
            Some(ref id) => Value::Text(id.clone()),
            None => Value::Null,
        };
        self.insert_record(
            "projects",
            &project.id,
            &project,
            &[
                ("title", Value::Text(project.title.clone())),
                ("programme_id", programme),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        tracing::info!(project = %project.id, "project created");
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> Result<Project, IsaError> {
        self.get_record("projects", id)
            .map_err(|e| match e {
                IsaError::NotFound(_) => IsaError::NotFound(format!("project '{}' not found", id)),
                other => other,
            })
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, IsaError> {
        self.query_records("SELECT data FROM projects ORDER BY title", &[])
    }

    // ── Memberships ──

    /// Add an account to a project. Adding an existing membership again
    /// is a no-op.
    pub fn add_member(&self, project_id: &str, input: AddMember) -> Result<Membership, IsaError> {
        self.get_project(project_id)?;
        if input.account_id.trim().is_empty() {
            return Err(IsaError::Invalid(vec!["account_id can't be blank".into()]));
        }
        self.sql.exec(
            "INSERT OR IGNORE INTO memberships (project_id, account_id, role, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            &[
                Value::Text(project_id.to_string()),
                Value::Text(input.account_id.clone()),
                Value::Text(input.role.as_str().to_string()),
                Value::Text(now_rfc3339()),
            ],
        )?;
        tracing::info!(project = %project_id, account = %input.account_id, role = input.role.as_str(), "member added");
        Ok(Membership {
            project_id: project_id.to_string(),
            account_id: input.account_id,
            role: input.role,
        })
    }

    /// Projects the account belongs to, in any role.
    pub fn projects_of(&self, account_id: &str) -> Result<Vec<String>, IsaError> {
        let rows = self.sql.query(
            "SELECT DISTINCT project_id FROM memberships WHERE account_id = ?1",
            &[Value::Text(account_id.to_string())],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("project_id").map(str::to_string))
            .collect())
    }

    /// Distinct gatekeepers of any of the given projects, sorted.
    pub fn gatekeepers_of(&self, project_ids: &[String]) -> Result<Vec<String>, IsaError> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (0..project_ids.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT DISTINCT account_id FROM memberships
             WHERE role = ?1 AND project_id IN ({})
             ORDER BY account_id",
            placeholders
        );
        let mut params = vec![Value::Text(ProjectRole::Gatekeeper.as_str().to_string())];
        params.extend(project_ids.iter().map(|id| Value::Text(id.clone())));

        let rows = self.sql.query(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("account_id").map(str::to_string))
            .collect())
    }
}
