use isahub_core::{Actor, ListParams, ListResult, new_id, now_rfc3339};
use isahub_sql::Value;

use crate::model::{Account, CreateAccount};
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Create a new account.
    pub fn create_account(&self, input: CreateAccount) -> Result<Account, AuthError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("name can't be blank".into()));
        }

        let now = now_rfc3339();
        let account = Account {
            id: new_id(),
            name: name.to_string(),
            email: input.email,
            active: true,
            admin: input.admin,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let mut indexes: Vec<(&str, Value)> = vec![
            ("name", Value::Text(account.name.clone())),
            ("active", Value::Integer(1)),
            ("created_at", Value::Text(now.clone())),
            ("updated_at", Value::Text(now)),
        ];
        if let Some(ref email) = account.email {
            indexes.push(("email", Value::Text(email.clone())));
        }

        self.insert_record("accounts", &account.id, &account, &indexes)?;
        tracing::info!(account = %account.id, admin = account.admin, "account created");
        Ok(account)
    }

    /// Get an account by id.
    pub fn get_account(&self, id: &str) -> Result<Account, AuthError> {
        self.get_record("accounts", id)
            .map_err(|e| match e {
                AuthError::NotFound(_) => AuthError::NotFound(format!("account '{}' not found", id)),
                other => other,
            })
    }

    /// List accounts with pagination.
    pub fn list_accounts(&self, params: &ListParams) -> Result<ListResult<Account>, AuthError> {
        let (items, total) = self.list_records("accounts", params.limit, params.offset)?;
        Ok(ListResult { items, total })
    }

    /// Load the account addressed by a request and make sure the caller
    /// owns it.
    ///
    /// A missing account is `NotFound`; any other caller, anonymous or
    /// not, is `Unauthorized`. Admins get no exemption here.
    pub fn find_and_check_owner(
        &self,
        requester: Option<&Actor>,
        account_id: &str,
    ) -> Result<Account, AuthError> {
        let account = self.get_account(account_id)?;
        match requester {
            Some(actor) if actor.id == account.id => Ok(account),
            _ => {
                tracing::warn!(
                    account = %account_id,
                    requester = requester.map(|a| a.id.as_str()).unwrap_or("anonymous"),
                    "rejected access to another account's sessions"
                );
                Err(AuthError::Unauthorized(
                    "user not found (id not authorized)".into(),
                ))
            }
        }
    }
}
