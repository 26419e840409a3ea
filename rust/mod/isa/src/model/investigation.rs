use isahub_jsonapi::{Linkage, Resource, Timestamps};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::Policy;

/// Top-level ISA entity grouping studies under one or more projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Owning projects; never empty.
    pub project_ids: Vec<String>,

    /// Account that created the investigation.
    pub contributor_id: String,

    /// Credited accounts in display order. Duplicates are kept.
    #[serde(default)]
    pub creator_ids: Vec<String>,

    /// Free-text credit for people without an account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_creators: Option<String>,

    #[serde(default)]
    pub policy: Policy,

    pub created_at: String,
    pub updated_at: String,
}

impl Resource for Investigation {
    const TYPE: &'static str = "investigations";

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("title".into(), json!(self.title));
        attrs.insert("description".into(), json!(self.description));
        attrs.insert("other_creators".into(), json!(self.other_creators));
        attrs.insert("policy".into(), json!(self.policy));
        attrs
    }

    fn relationships(&self) -> Vec<(&'static str, Linkage)> {
        vec![
            ("projects", Linkage::many("projects", &self.project_ids)),
            ("contributor", Linkage::one("users", &self.contributor_id)),
            ("creators", Linkage::many("users", &self.creator_ids)),
        ]
    }

    fn timestamps(&self) -> Option<Timestamps> {
        Some(Timestamps {
            created: self.created_at.clone(),
            modified: self.updated_at.clone(),
        })
    }
}

/// Submitted investigation attributes, for both create and update.
///
/// On update, absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestigationInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_ids: Option<Vec<String>>,
    #[serde(default)]
    pub other_creators: Option<String>,
    #[serde(default)]
    pub creator_ids: Option<Vec<String>>,
    #[serde(default)]
    pub policy: Option<Policy>,
}

/// Optional list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestigationFilter {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub programme: Option<String>,
}

/// Unsaved investigation form: the empty `new` form, an `edit` form or a
/// copy prefilled from an existing investigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestigationForm {
    /// Where the form submits to.
    pub action: String,
    /// HTTP method of the submission.
    pub method: &'static str,
    pub investigation: FormFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormFields {
    pub title: String,
    pub description: Option<String>,
    pub project_ids: Vec<String>,
    pub other_creators: Option<String>,
    pub creator_ids: Vec<String>,
    pub policy: Policy,
}

impl From<&Investigation> for FormFields {
    fn from(inv: &Investigation) -> Self {
        Self {
            title: inv.title.clone(),
            description: inv.description.clone(),
            project_ids: inv.project_ids.clone(),
            other_creators: inv.other_creators.clone(),
            creator_ids: inv.creator_ids.clone(),
            policy: inv.policy.clone(),
        }
    }
}
