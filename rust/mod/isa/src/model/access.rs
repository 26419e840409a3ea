use serde::{Deserialize, Serialize};

/// Access tier, ordered by openness.
///
/// Each tier includes the rights of every tier before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Private,
    Visible,
    Accessible,
    Editing,
    Managing,
}

impl Default for AccessType {
    fn default() -> Self {
        Self::Private
    }
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Private => "private",
            AccessType::Visible => "visible",
            AccessType::Accessible => "accessible",
            AccessType::Editing => "editing",
            AccessType::Managing => "managing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "private" => Some(AccessType::Private),
            "visible" => Some(AccessType::Visible),
            "accessible" => Some(AccessType::Accessible),
            "editing" => Some(AccessType::Editing),
            "managing" => Some(AccessType::Managing),
            _ => None,
        }
    }
}

/// Who a permission is granted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Contributor {
    /// Every member of a project.
    Project(String),
    /// A single account.
    Person(String),
}

/// An explicit grant on top of the public tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub contributor: Contributor,
    pub access_type: AccessType,
}

/// Access policy attached to an investigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Public tier: what everyone, including anonymous callers, may do.
    #[serde(default)]
    pub access_type: AccessType,

    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// An operation gated by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Download,
    Edit,
    Manage,
    Delete,
}

impl Action {
    /// Lowest tier that allows this action.
    pub fn required_access(&self) -> AccessType {
        match self {
            Action::View => AccessType::Visible,
            Action::Download => AccessType::Accessible,
            Action::Edit => AccessType::Editing,
            Action::Manage | Action::Delete => AccessType::Managing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Download => "download",
            Action::Edit => "edit",
            Action::Manage => "manage",
            Action::Delete => "delete",
        }
    }
}
