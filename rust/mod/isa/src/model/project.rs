use isahub_jsonapi::{Linkage, Resource, Timestamps};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A funding programme grouping projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Programme {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgramme {
    pub title: String,
}

/// A project owns investigations and has member accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programme_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    #[serde(default)]
    pub programme_id: Option<String>,
}

/// Role of an account within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Member,
    /// Approves publication of the project's content.
    Gatekeeper,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Member => "member",
            ProjectRole::Gatekeeper => "gatekeeper",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub project_id: String,
    pub account_id: String,
    pub role: ProjectRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMember {
    pub account_id: String,
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

impl Resource for Programme {
    const TYPE: &'static str = "programmes";

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("title".into(), json!(self.title));
        attrs
    }

    fn timestamps(&self) -> Option<Timestamps> {
        Some(Timestamps {
            created: self.created_at.clone(),
            modified: self.updated_at.clone(),
        })
    }
}

impl Resource for Project {
    const TYPE: &'static str = "projects";

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("title".into(), json!(self.title));
        attrs
    }

    fn relationships(&self) -> Vec<(&'static str, Linkage)> {
        let programme = self
            .programme_id
            .as_deref()
            .map(|id| isahub_jsonapi::Identifier::new("programmes", id));
        vec![("programme", Linkage::One(programme))]
    }

    fn timestamps(&self) -> Option<Timestamps> {
        Some(Timestamps {
            created: self.created_at.clone(),
            modified: self.updated_at.clone(),
        })
    }
}
