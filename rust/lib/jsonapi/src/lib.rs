//! JSON-API envelope for domain resources.
//!
//! Wraps any [`Resource`] in a document of the shape
//!
//! ```json
//! {
//!   "data": {"type": "investigations", "id": "..", "attributes": {..},
//!            "relationships": {"projects": {"data": [..]}},
//!            "links": {"self": "/investigations/.."}},
//!   "meta": {"created": "..", "modified": ".."},
//!   "jsonapi": {"version": "1.0"}
//! }
//! ```
//!
//! Relationship objects only ever carry resource linkage (`data`). The
//! default `self`/`related` relationship hyperlinks of JSON-API are not
//! generated.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// The JSON-API version advertised in every document.
pub const VERSION: &str = "1.0";

/// Media type of JSON-API documents.
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

/// Creation/modification timestamps of a resource (RFC 3339).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamps {
    pub created: String,
    pub modified: String,
}

/// A `{type, id}` pair used in relationship linkage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl Identifier {
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

/// Resource linkage of one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    One(Option<Identifier>),
    Many(Vec<Identifier>),
}

impl Linkage {
    /// To-many linkage of `kind` for each id, in order.
    pub fn many<'a>(kind: &str, ids: impl IntoIterator<Item = &'a String>) -> Self {
        Linkage::Many(ids.into_iter().map(|id| Identifier::new(kind, id)).collect())
    }

    pub fn one(kind: &str, id: &str) -> Self {
        Linkage::One(Some(Identifier::new(kind, id)))
    }

    fn to_value(&self) -> Value {
        match self {
            Linkage::One(Some(ident)) => json!(ident),
            Linkage::One(None) => Value::Null,
            Linkage::Many(idents) => json!(idents),
        }
    }
}

/// A domain object that can be rendered as a JSON-API resource object.
pub trait Resource {
    /// Plural resource type, also the first path segment of its self link.
    const TYPE: &'static str;

    fn id(&self) -> &str;

    /// Attribute members. Must not contain `id` or `type`.
    fn attributes(&self) -> Map<String, Value>;

    fn relationships(&self) -> Vec<(&'static str, Linkage)> {
        Vec::new()
    }

    /// `None` for objects that do not track timestamps; their meta
    /// block then carries empty strings.
    fn timestamps(&self) -> Option<Timestamps> {
        None
    }

    /// Path of the resource's own route. Resources only reachable under
    /// a parent override the default `/{type}/{id}`.
    fn self_link(&self) -> String {
        format!("/{}/{}", Self::TYPE, self.id())
    }
}

/// The `meta` block of a resource: `created`/`modified`, or `""` each.
pub fn meta<R: Resource>(resource: &R) -> Map<String, Value> {
    let (created, modified) = match resource.timestamps() {
        Some(ts) => (ts.created, ts.modified),
        None => (String::new(), String::new()),
    };
    let mut meta = Map::new();
    meta.insert("created".into(), Value::String(created));
    meta.insert("modified".into(), Value::String(modified));
    meta
}

fn resource_object<R: Resource>(resource: &R, with_meta: bool) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), json!(R::TYPE));
    obj.insert("id".into(), json!(resource.id()));
    obj.insert("attributes".into(), Value::Object(resource.attributes()));

    let relationships: Map<String, Value> = resource
        .relationships()
        .into_iter()
        .map(|(name, linkage)| (name.to_string(), json!({ "data": linkage.to_value() })))
        .collect();
    if !relationships.is_empty() {
        obj.insert("relationships".into(), Value::Object(relationships));
    }

    obj.insert(
        "links".into(),
        json!({ "self": resource.self_link() }),
    );
    if with_meta {
        obj.insert("meta".into(), Value::Object(meta(resource)));
    }
    Value::Object(obj)
}

/// A top-level JSON-API document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    data: Value,
    meta: Map<String, Value>,
}

impl Document {
    /// Add (or replace) a member of the top-level `meta` block.
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn to_value(&self) -> Value {
        json!({
            "data": self.data,
            "meta": self.meta,
            "jsonapi": { "version": VERSION },
        })
    }
}

impl IntoResponse for Document {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            self.to_value().to_string(),
        )
            .into_response()
    }
}

/// Serialize a single resource. The resource timestamps become the
/// top-level `meta`.
pub fn serialize<R: Resource>(resource: &R) -> Document {
    Document {
        data: resource_object(resource, false),
        meta: meta(resource),
    }
}

/// Serialize a page of resources. Each resource object carries its own
/// `meta`; the top-level `meta` holds the unpaged `total`.
pub fn serialize_collection<R: Resource>(resources: &[R], total: usize) -> Document {
    let data = resources
        .iter()
        .map(|r| resource_object(r, true))
        .collect::<Vec<_>>();
    let mut meta = Map::new();
    meta.insert("total".into(), json!(total));
    Document {
        data: Value::Array(data),
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        id: String,
        text: String,
        tags: Vec<String>,
        author: Option<String>,
        stamps: Option<Timestamps>,
    }

    impl Resource for Note {
        const TYPE: &'static str = "notes";

        fn id(&self) -> &str {
            &self.id
        }

        fn attributes(&self) -> Map<String, Value> {
            let mut attrs = Map::new();
            attrs.insert("text".into(), json!(self.text));
            attrs
        }

        fn relationships(&self) -> Vec<(&'static str, Linkage)> {
            vec![
                ("tags", Linkage::many("tags", &self.tags)),
                (
                    "author",
                    Linkage::One(self.author.as_deref().map(|a| Identifier::new("people", a))),
                ),
            ]
        }

        fn timestamps(&self) -> Option<Timestamps> {
            self.stamps.clone()
        }
    }

    /// A resource type without timestamp tracking.
    struct Tag(String);

    impl Resource for Tag {
        const TYPE: &'static str = "tags";

        fn id(&self) -> &str {
            &self.0
        }

        fn attributes(&self) -> Map<String, Value> {
            Map::new()
        }
    }

    /// Only routed beneath its note.
    struct Comment {
        id: String,
        note_id: String,
    }

    impl Resource for Comment {
        const TYPE: &'static str = "comments";

        fn id(&self) -> &str {
            &self.id
        }

        fn attributes(&self) -> Map<String, Value> {
            Map::new()
        }

        fn self_link(&self) -> String {
            format!("/notes/{}/comments/{}", self.note_id, self.id)
        }
    }

    fn note() -> Note {
        Note {
            id: "n1".into(),
            text: "hello".into(),
            tags: vec!["t1".into(), "t2".into()],
            author: Some("p1".into()),
            stamps: Some(Timestamps {
                created: "2024-01-01T00:00:00+00:00".into(),
                modified: "2024-02-01T00:00:00+00:00".into(),
            }),
        }
    }

    #[test]
    fn test_document_shape() {
        let doc = serialize(&note()).to_value();
        assert_eq!(doc["jsonapi"]["version"], "1.0");
        assert_eq!(doc["data"]["type"], "notes");
        assert_eq!(doc["data"]["id"], "n1");
        assert_eq!(doc["data"]["attributes"]["text"], "hello");
        assert_eq!(doc["data"]["links"]["self"], "/notes/n1");
    }

    #[test]
    fn test_nested_resource_self_link() {
        let comment = Comment {
            id: "c1".into(),
            note_id: "n1".into(),
        };
        let doc = serialize(&comment).to_value();
        assert_eq!(doc["data"]["links"]["self"], "/notes/n1/comments/c1");
        assert_eq!(doc["data"]["type"], "comments");
    }

    #[test]
    fn test_meta_uses_timestamps() {
        let doc = serialize(&note()).to_value();
        assert_eq!(doc["meta"]["created"], "2024-01-01T00:00:00+00:00");
        assert_eq!(doc["meta"]["modified"], "2024-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_meta_empty_without_timestamps() {
        let doc = serialize(&Tag("t1".into())).to_value();
        assert_eq!(doc["meta"]["created"], "");
        assert_eq!(doc["meta"]["modified"], "");
    }

    #[test]
    fn test_relationships_have_no_links() {
        let doc = serialize(&note()).to_value();
        let rels = doc["data"]["relationships"].as_object().unwrap();
        assert_eq!(rels.len(), 2);
        for (_, rel) in rels {
            let rel = rel.as_object().unwrap();
            assert!(rel.contains_key("data"));
            assert!(!rel.contains_key("links"));
        }
        assert_eq!(
            doc["data"]["relationships"]["tags"]["data"],
            json!([{"type": "tags", "id": "t1"}, {"type": "tags", "id": "t2"}])
        );
        assert_eq!(
            doc["data"]["relationships"]["author"]["data"],
            json!({"type": "people", "id": "p1"})
        );
    }

    #[test]
    fn test_empty_to_one_is_null() {
        let mut n = note();
        n.author = None;
        let doc = serialize(&n).to_value();
        assert!(doc["data"]["relationships"]["author"]["data"].is_null());
    }

    #[test]
    fn test_no_relationships_member_when_none() {
        let doc = serialize(&Tag("t1".into())).to_value();
        assert!(doc["data"].get("relationships").is_none());
    }

    #[test]
    fn test_with_meta_extends_top_level_meta() {
        let doc = serialize(&note()).with_meta("can_edit", true).to_value();
        assert_eq!(doc["meta"]["can_edit"], true);
        assert_eq!(doc["meta"]["created"], "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_collection() {
        let doc = serialize_collection(&[note(), note()], 7).to_value();
        let data = doc["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["meta"]["created"], "2024-01-01T00:00:00+00:00");
        assert_eq!(doc["meta"]["total"], 7);
        assert_eq!(doc["jsonapi"]["version"], "1.0");
    }

    #[test]
    fn test_response_content_type() {
        let resp = serialize(&note()).into_response();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            CONTENT_TYPE
        );
    }
}
