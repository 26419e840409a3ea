use isahub_sql::SQLStore;

use crate::service::IsaError;

/// Initialize the SQLite schema for the ISA module.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), IsaError> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS programmes (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",

        "CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            programme_id TEXT,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (programme_id) REFERENCES programmes(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_projects_programme ON projects(programme_id)",

        // Project membership; an account may hold both roles.
        "CREATE TABLE IF NOT EXISTS memberships (
            project_id TEXT NOT NULL,
            account_id TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (project_id, account_id, role),
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_memberships_account ON memberships(account_id)",

        "CREATE TABLE IF NOT EXISTS investigations (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            contributor_id TEXT NOT NULL,
            access_type TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",

        "CREATE TABLE IF NOT EXISTS investigation_projects (
            investigation_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            PRIMARY KEY (investigation_id, project_id),
            FOREIGN KEY (investigation_id) REFERENCES investigations(id) ON DELETE CASCADE,
            FOREIGN KEY (project_id) REFERENCES projects(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_investigation_projects_project
            ON investigation_projects(project_id)",

        // No cascade: a study keeps its investigation alive.
        "CREATE TABLE IF NOT EXISTS studies (
            id TEXT PRIMARY KEY,
            investigation_id TEXT NOT NULL,
            title TEXT NOT NULL,
            contributor_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (investigation_id) REFERENCES investigations(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_studies_investigation ON studies(investigation_id)",

        "CREATE TABLE IF NOT EXISTS publish_logs (
            id TEXT PRIMARY KEY,
            investigation_id TEXT NOT NULL,
            state TEXT NOT NULL,
            requested_access TEXT NOT NULL,
            actor_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (investigation_id) REFERENCES investigations(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_publish_logs_investigation
            ON publish_logs(investigation_id)",

        // Notification outbox. Rows outlive the investigation they mention.
        "CREATE TABLE IF NOT EXISTS outbox (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            recipient_id TEXT NOT NULL,
            investigation_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            delivered_at TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_outbox_investigation ON outbox(investigation_id)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])?;
    }

    Ok(())
}
