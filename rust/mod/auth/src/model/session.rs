use isahub_jsonapi::{Linkage, Resource, Timestamps};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A third-party login session held on behalf of an account.
///
/// The provider tokens never leave the service: the JSON-API rendering
/// only exposes provider and expiry.
#[derive(Clone)]
pub struct OauthSession {
    pub id: String,
    pub account_id: String,
    /// External provider name, e.g. "zenodo" or "github".
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// RFC 3339 expiry of the access token, if the provider gave one.
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl std::fmt::Debug for OauthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthSession")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("provider", &self.provider)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Input for recording a session obtained from a provider callback.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSession {
    pub provider: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl Resource for OauthSession {
    const TYPE: &'static str = "oauth_sessions";

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("provider".into(), json!(self.provider));
        attrs.insert("expires_at".into(), json!(self.expires_at));
        attrs
    }

    fn relationships(&self) -> Vec<(&'static str, Linkage)> {
        vec![("user", Linkage::one("users", &self.account_id))]
    }

    fn timestamps(&self) -> Option<Timestamps> {
        Some(Timestamps {
            created: self.created_at.clone(),
            modified: self.updated_at.clone(),
        })
    }

    fn self_link(&self) -> String {
        format!("/users/{}/oauth_sessions/{}", self.account_id, self.id)
    }
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: account id, or `root`.
    pub sub: String,

    /// Display name.
    pub name: String,

    #[serde(default)]
    pub admin: bool,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Bearer token returned by login and token minting.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
