use isahub_jsonapi::{Linkage, Resource, Timestamps};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A study within an investigation. Its presence blocks deletion of the
/// parent investigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: String,
    pub investigation_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub contributor_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudy {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource for Study {
    const TYPE: &'static str = "studies";

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("title".into(), json!(self.title));
        attrs.insert("description".into(), json!(self.description));
        attrs
    }

    fn relationships(&self) -> Vec<(&'static str, Linkage)> {
        vec![
            ("investigation", Linkage::one("investigations", &self.investigation_id)),
            ("contributor", Linkage::one("users", &self.contributor_id)),
        ]
    }

    fn timestamps(&self) -> Option<Timestamps> {
        Some(Timestamps {
            created: self.created_at.clone(),
            modified: self.updated_at.clone(),
        })
    }
}
