use isahub_jsonapi::{Linkage, Resource, Timestamps};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::AccessType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    /// Held until a gatekeeper decides.
    WaitingForApproval,
    Published,
    Rejected,
    /// The requester moved the tier back before anyone decided.
    Withdrawn,
}

impl PublishState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishState::WaitingForApproval => "waiting_for_approval",
            PublishState::Published => "published",
            PublishState::Rejected => "rejected",
            PublishState::Withdrawn => "withdrawn",
        }
    }
}

/// Audit record of one change to an investigation's public tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishLog {
    pub id: String,
    pub investigation_id: String,
    pub state: PublishState,
    /// Public tier the actor asked for.
    pub requested_access: AccessType,
    pub actor_id: String,
    pub created_at: String,
}

impl Resource for PublishLog {
    const TYPE: &'static str = "publish_logs";

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("state".into(), json!(self.state));
        attrs.insert("requested_access".into(), json!(self.requested_access));
        attrs
    }

    fn relationships(&self) -> Vec<(&'static str, Linkage)> {
        vec![
            ("investigation", Linkage::one("investigations", &self.investigation_id)),
            ("actor", Linkage::one("users", &self.actor_id)),
        ]
    }

    fn timestamps(&self) -> Option<Timestamps> {
        Some(Timestamps {
            created: self.created_at.clone(),
            modified: self.created_at.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PublishApprovalRequested,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::PublishApprovalRequested => "publish_approval_requested",
        }
    }
}

/// Outbox row: a message to deliver through the mailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub recipient_id: String,
    pub investigation_id: String,
    pub requester_id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
}
