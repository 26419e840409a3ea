use isahub_core::{new_id, now_rfc3339};
use isahub_sql::{Row, Value};

use crate::model::{OauthSession, RecordSession};
use crate::service::{AuthError, AuthService};

const SESSION_COLUMNS: &str =
    "id, account_id, provider, access_token, refresh_token, expires_at, created_at, updated_at";

fn text(row: &Row, col: &str) -> Result<String, AuthError> {
    row.get_str(col)
        .map(str::to_string)
        .ok_or_else(|| AuthError::Internal(format!("oauth_sessions.{} missing", col)))
}

fn session_from_row(row: &Row) -> Result<OauthSession, AuthError> {
    Ok(OauthSession {
        id: text(row, "id")?,
        account_id: text(row, "account_id")?,
        provider: text(row, "provider")?,
        access_token: text(row, "access_token")?,
        refresh_token: row.get_str("refresh_token").map(str::to_string),
        expires_at: row.get_str("expires_at").map(str::to_string),
        created_at: text(row, "created_at")?,
        updated_at: text(row, "updated_at")?,
    })
}

fn optional(v: &Option<String>) -> Value {
    match v {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

impl AuthService {
    /// All sessions held for an account, newest first.
    pub fn list_sessions(&self, account_id: &str) -> Result<Vec<OauthSession>, AuthError> {
        let sql = format!(
            "SELECT {} FROM oauth_sessions WHERE account_id = ?1 \
             ORDER BY created_at DESC, rowid DESC",
            SESSION_COLUMNS
        );
        let rows = self.sql.query(&sql, &[Value::Text(account_id.to_string())])?;
        rows.iter().map(session_from_row).collect()
    }

    /// Register a session handed back by an external provider.
    pub fn record_session(
        &self,
        account_id: &str,
        input: RecordSession,
    ) -> Result<OauthSession, AuthError> {
        let provider = input.provider.trim();
        if provider.is_empty() {
            return Err(AuthError::Validation("provider can't be blank".into()));
        }
        if input.access_token.is_empty() {
            return Err(AuthError::Validation("access_token can't be blank".into()));
        }
        if let Some(ref exp) = input.expires_at {
            chrono::DateTime::parse_from_rfc3339(exp).map_err(|_| {
                AuthError::Validation(format!("expires_at '{}' is not RFC 3339", exp))
            })?;
        }

        let now = now_rfc3339();
        let session = OauthSession {
            id: new_id(),
            account_id: account_id.to_string(),
            provider: provider.to_string(),
            access_token: input.access_token,
            refresh_token: input.refresh_token,
            expires_at: input.expires_at,
            created_at: now.clone(),
            updated_at: now,
        };

        let sql = format!(
            "INSERT INTO oauth_sessions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            SESSION_COLUMNS
        );
        self.sql.exec(
            &sql,
            &[
                Value::Text(session.id.clone()),
                Value::Text(session.account_id.clone()),
                Value::Text(session.provider.clone()),
                Value::Text(session.access_token.clone()),
                optional(&session.refresh_token),
                optional(&session.expires_at),
                Value::Text(session.created_at.clone()),
                Value::Text(session.updated_at.clone()),
            ],
        )?;

        tracing::info!(account = %account_id, session = %session.id, provider = %session.provider, "oauth session recorded");
        Ok(session)
    }

    /// Delete one session of an account. Deleting a session that does not
    /// exist, or that belongs to another account, is a no-op.
    ///
    /// Returns whether a row was removed.
    pub fn revoke_session(&self, account_id: &str, session_id: &str) -> Result<bool, AuthError> {
        let affected = self.sql.exec(
            "DELETE FROM oauth_sessions WHERE id = ?1 AND account_id = ?2",
            &[
                Value::Text(session_id.to_string()),
                Value::Text(account_id.to_string()),
            ],
        )?;
        if affected > 0 {
            tracing::info!(account = %account_id, session = %session_id, "oauth session revoked");
        } else {
            tracing::debug!(account = %account_id, session = %session_id, "oauth session already gone");
        }
        Ok(affected > 0)
    }
}
