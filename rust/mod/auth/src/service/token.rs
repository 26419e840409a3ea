use axum::http::HeaderMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use isahub_core::{Actor, Authenticator, ServiceError, bearer_token};

use crate::model::{Account, Claims, TokenResponse};
use crate::service::{AuthError, AuthService};

/// Subject of the bootstrap superadmin. It has no account row.
pub const ROOT_ACCOUNT_ID: &str = "root";

impl AuthService {
    fn sign(&self, sub: &str, name: &str, admin: bool) -> Result<TokenResponse, AuthError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.config.token_ttl);
        let claims = Claims {
            sub: sub.to_string(),
            name: name.to_string(),
            admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("JWT encode failed: {}", e)))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_ttl,
        })
    }

    /// Issue a signed access token for an account.
    pub fn issue_token(&self, account: &Account) -> Result<TokenResponse, AuthError> {
        if !account.active {
            return Err(AuthError::Validation(format!(
                "account '{}' is deactivated",
                account.id
            )));
        }
        let token = self.sign(&account.id, &account.name, account.admin)?;
        tracing::info!(account = %account.id, "token issued");
        Ok(token)
    }

    /// Issue a token for the root superadmin.
    pub fn issue_root_token(&self) -> Result<TokenResponse, AuthError> {
        self.sign(ROOT_ACCOUNT_ID, "Root", true)
    }

    /// Verify a bearer token and resolve it to the calling actor.
    ///
    /// Admin status is re-read from the account row, so a demoted or
    /// deactivated account loses its rights before the token expires.
    pub fn verify_token(&self, token: &str) -> Result<Actor, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::Unauthorized(format!("invalid token: {}", e)))?;
        let claims = data.claims;

        if claims.sub == ROOT_ACCOUNT_ID {
            return Ok(Actor {
                id: ROOT_ACCOUNT_ID.to_string(),
                name: claims.name,
                admin: true,
            });
        }

        let account = self.get_account(&claims.sub).map_err(|e| match e {
            AuthError::NotFound(_) => AuthError::Unauthorized("account no longer exists".into()),
            other => other,
        })?;
        if !account.active {
            return Err(AuthError::Unauthorized("account is deactivated".into()));
        }

        Ok(Actor {
            id: account.id,
            name: account.name,
            admin: account.admin,
        })
    }
}

impl Authenticator for AuthService {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Option<Actor>, ServiceError> {
        match bearer_token(headers) {
            None => Ok(None),
            Some(token) => self.verify_token(token).map(Some).map_err(ServiceError::from),
        }
    }
}
