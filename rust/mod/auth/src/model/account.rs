use isahub_jsonapi::{Resource, Timestamps};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A logged-in identity. Owns OAuth sessions and contributes ISA content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Display name.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Deactivated accounts cannot authenticate.
    #[serde(default = "default_true")]
    pub active: bool,

    /// System administrator.
    #[serde(default)]
    pub admin: bool,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

fn default_true() -> bool {
    true
}

impl Resource for Account {
    const TYPE: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("name".into(), json!(self.name));
        attrs.insert("email".into(), json!(self.email));
        attrs.insert("active".into(), json!(self.active));
        attrs.insert("admin".into(), json!(self.admin));
        attrs
    }

    fn timestamps(&self) -> Option<Timestamps> {
        Some(Timestamps {
            created: self.created_at.clone(),
            modified: self.updated_at.clone(),
        })
    }
}
