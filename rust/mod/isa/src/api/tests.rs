use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use isahub_core::Actor;

use crate::api::build_router;
use crate::model::{AccessType, CreateProgramme, CreateProject, CreateStudy, Policy, ProjectRole};
use crate::service::test_support::{Fixture, admin, fixture, input, join, person, project, public};

struct Response {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl Response {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

async fn call(
    router: &axum::Router,
    actor: Option<&Actor>,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let mut req = builder.body(body).unwrap();
    if let Some(actor) = actor {
        req.extensions_mut().insert(actor.clone());
    }
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec();
    Response {
        status,
        headers,
        body,
    }
}

fn setup() -> (Fixture, axum::Router) {
    let f = fixture();
    let router = build_router(f.svc.clone());
    (f, router)
}

#[tokio::test]
async fn create_then_show() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let owner = person("owner");

    let resp = call(
        &router,
        Some(&owner),
        "POST",
        "/investigations",
        Some(json!({
            "title": "Metabolomics",
            "description": "growth curves",
            "project_ids": [p.id],
            "creator_ids": ["c1", "c1"],
            "policy": {"access_type": "private", "permissions": []}
        })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.header(header::CONTENT_TYPE), Some("application/vnd.api+json"));
    let created = resp.json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = call(&router, Some(&owner), "GET", &format!("/investigations/{}", id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let doc = resp.json();
    assert_eq!(doc["data"]["attributes"], created["data"]["attributes"]);
    assert_eq!(doc["data"]["attributes"]["title"], "Metabolomics");
    assert_eq!(doc["data"]["type"], "investigations");
    assert_eq!(doc["data"]["links"]["self"], format!("/investigations/{}", id));
    assert_eq!(
        doc["data"]["relationships"]["creators"]["data"],
        json!([{"type": "users", "id": "c1"}, {"type": "users", "id": "c1"}])
    );
    assert!(doc["data"]["relationships"]["projects"].get("links").is_none());
    assert_eq!(doc["jsonapi"]["version"], "1.0");
    assert!(!doc["meta"]["created"].as_str().unwrap().is_empty());
    assert_eq!(doc["meta"]["can_edit"], true);
    assert_eq!(doc["meta"]["can_delete"], true);
}

#[tokio::test]
async fn create_without_project_fails_validation() {
    let (f, router) = setup();
    let resp = call(
        &router,
        Some(&person("owner")),
        "POST",
        "/investigations",
        Some(json!({"title": "Orphan"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["code"], "VALIDATION_FAILED");
    assert_eq!(f.svc.investigation_count().unwrap(), 0);
}

#[tokio::test]
async fn show_private_anonymous_vs_stranger() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let inv = f
        .svc
        .create_investigation(Some(&person("owner")), input("Inv", &p, Policy::default()))
        .unwrap();
    let uri = format!("/investigations/{}", inv.id);

    let resp = call(&router, None, "GET", &uri, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    let resp = call(&router, Some(&person("eve")), "GET", &uri, None).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.json()["code"], "PERMISSION_DENIED");
    let resp = call(&router, None, "GET", "/investigations/ghost", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_private_to_visible_sends_one_request() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    join(&f.svc, &p, "gk", ProjectRole::Gatekeeper);
    let owner = person("owner");
    let inv = f
        .svc
        .create_investigation(Some(&owner), input("Inv", &p, Policy::default()))
        .unwrap();
    let uri = format!("/investigations/{}", inv.id);

    let resp = call(
        &router,
        Some(&owner),
        "PUT",
        &uri,
        Some(json!({"title": "Inv", "policy": {"access_type": "visible"}})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json()["data"]["attributes"]["policy"]["access_type"],
        "private"
    );
    assert_eq!(f.mailer.sent().len(), 1);

    // still hidden from the public
    let resp = call(&router, None, "GET", &uri, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = call(&router, Some(&person("gk")), "GET", "/publish_requests", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let doc = resp.json();
    assert_eq!(doc["meta"]["total"], 1);
    assert_eq!(doc["data"][0]["type"], "publish_logs");
    assert_eq!(doc["data"][0]["attributes"]["requested_access"], "visible");

    let resp = call(
        &router,
        Some(&person("gk")),
        "POST",
        &format!("/investigations/{}/publish_decision", inv.id),
        Some(json!({"approve": true})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    let resp = call(&router, None, "GET", &uri, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["meta"]["can_edit"], false);
}

#[tokio::test]
async fn update_visible_to_accessible_sends_nothing() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let owner = person("owner");
    let inv = f
        .svc
        .create_investigation(Some(&owner), input("Inv", &p, public(AccessType::Visible)))
        .unwrap();
    join(&f.svc, &p, "gk", ProjectRole::Gatekeeper);

    let resp = call(
        &router,
        Some(&owner),
        "PUT",
        &format!("/investigations/{}", inv.id),
        Some(json!({"policy": {"access_type": "accessible"}})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json()["data"]["attributes"]["policy"]["access_type"],
        "accessible"
    );
    assert!(f.mailer.sent().is_empty());
    assert!(f.svc.notifications_for(&inv.id).unwrap().is_empty());
}

#[tokio::test]
async fn unauthorized_update_is_forbidden() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let inv = f
        .svc
        .create_investigation(Some(&person("owner")), input("Inv", &p, public(AccessType::Visible)))
        .unwrap();
    let resp = call(
        &router,
        Some(&person("eve")),
        "PUT",
        &format!("/investigations/{}", inv.id),
        Some(json!({"title": "mine now"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(f.svc.get_investigation_record(&inv.id).unwrap().title, "Inv");
}

#[tokio::test]
async fn destroy_redirects_to_listing() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let owner = person("owner");
    let inv = f
        .svc
        .create_investigation(Some(&owner), input("Inv", &p, Policy::default()))
        .unwrap();

    let resp = call(&router, Some(&owner), "DELETE", &format!("/investigations/{}", inv.id), None).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.header(header::LOCATION), Some("/investigations"));
    assert_eq!(f.svc.investigation_count().unwrap(), 0);
}

#[tokio::test]
async fn destroy_with_study_conflicts() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let owner = person("owner");
    let inv = f
        .svc
        .create_investigation(Some(&owner), input("Inv", &p, Policy::default()))
        .unwrap();
    let resp = call(
        &router,
        Some(&owner),
        "POST",
        &format!("/investigations/{}/studies", inv.id),
        Some(json!({"title": "S1"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = call(&router, Some(&owner), "DELETE", &format!("/investigations/{}", inv.id), None).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(f.svc.investigation_count().unwrap(), 1);

    let resp = call(&router, Some(&owner), "GET", &format!("/investigations/{}", inv.id), None).await;
    assert_eq!(resp.json()["meta"]["can_delete"], false);
}

#[tokio::test]
async fn new_based_on_requires_login() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let inv = f
        .svc
        .create_investigation(Some(&person("owner")), input("the inv", &p, public(AccessType::Visible)))
        .unwrap();
    let uri = format!("/investigations/{}/new_based_on", inv.id);

    let resp = call(&router, None, "GET", &uri, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = call(&router, Some(&person("eve")), "GET", &uri, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let form = resp.json();
    assert_eq!(form["investigation"]["title"], "the inv");
    assert_eq!(form["action"], "/investigations");
    assert_eq!(f.svc.investigation_count().unwrap(), 1);
}

#[tokio::test]
async fn new_and_edit_forms() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let owner = person("owner");
    let inv = f
        .svc
        .create_investigation(Some(&owner), input("Inv", &p, Policy::default()))
        .unwrap();

    let resp = call(&router, Some(&owner), "GET", "/investigations/new", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["method"], "POST");
    let resp = call(&router, None, "GET", "/investigations/new", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let edit = format!("/investigations/{}/edit", inv.id);
    let resp = call(&router, Some(&owner), "GET", &edit, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["method"], "PUT");
    let resp = call(&router, Some(&person("eve")), "GET", &edit, None).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn ro_bundle_download() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let owner = person("owner");
    let inv = f
        .svc
        .create_investigation(Some(&owner), input("Inv", &p, Policy::default()))
        .unwrap();

    let resp = call(&router, Some(&owner), "GET", &format!("/investigations/{}/ro", inv.id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.header(header::CONTENT_TYPE),
        Some("application/vnd.wf4ever.robundle+zip")
    );
    assert_eq!(
        resp.header(header::CONTENT_DISPOSITION).map(str::to_string),
        Some(format!("attachment; filename=\"investigation-{}.ro.zip\"", inv.id))
    );
    assert_eq!(resp.body, format!("PK:{}:0", inv.id).into_bytes());
}

#[tokio::test]
async fn listing_filters() {
    let (f, router) = setup();
    let programme = f
        .svc
        .create_programme(CreateProgramme { title: "SysMO".into() })
        .unwrap();
    let a = f
        .svc
        .create_project(CreateProject {
            title: "A".into(),
            programme_id: Some(programme.id.clone()),
        })
        .unwrap();
    let b = project(&f.svc, "B");
    let owner = person("owner");
    f.svc
        .create_investigation(Some(&owner), input("In A", &a, public(AccessType::Visible)))
        .unwrap();
    f.svc
        .create_investigation(Some(&owner), input("In B", &b, public(AccessType::Visible)))
        .unwrap();

    let resp = call(&router, None, "GET", "/investigations", None).await;
    assert_eq!(resp.json()["meta"]["total"], 2);

    let resp = call(&router, None, "GET", &format!("/investigations?project={}", b.id), None).await;
    let doc = resp.json();
    assert_eq!(doc["meta"]["total"], 1);
    assert_eq!(doc["data"][0]["attributes"]["title"], "In B");

    let resp = call(
        &router,
        None,
        "GET",
        &format!("/programmes/{}/investigations", programme.id),
        None,
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    let doc = resp.json();
    assert_eq!(doc["meta"]["total"], 1);
    assert_eq!(doc["data"][0]["attributes"]["title"], "In A");

    let resp = call(&router, None, "GET", "/programmes/ghost/investigations", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = call(&router, None, "GET", "/investigations?limit=1", None).await;
    let doc = resp.json();
    assert_eq!(doc["meta"]["total"], 2);
    assert_eq!(doc["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn studies_routes() {
    let (f, router) = setup();
    let p = project(&f.svc, "P");
    let owner = person("owner");
    let inv = f
        .svc
        .create_investigation(Some(&owner), input("Inv", &p, public(AccessType::Visible)))
        .unwrap();
    let study = f
        .svc
        .create_study(
            Some(&owner),
            &inv.id,
            CreateStudy {
                title: "S1".into(),
                description: None,
            },
        )
        .unwrap();

    let resp = call(&router, None, "GET", &format!("/investigations/{}/studies", inv.id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let doc = resp.json();
    assert_eq!(doc["data"][0]["type"], "studies");
    assert_eq!(
        doc["data"][0]["relationships"]["investigation"]["data"]["id"],
        inv.id.as_str()
    );

    let resp = call(&router, Some(&person("eve")), "DELETE", &format!("/studies/{}", study.id), None).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let resp = call(&router, Some(&owner), "DELETE", &format!("/studies/{}", study.id), None).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn project_administration() {
    let (_, router) = setup();

    let resp = call(
        &router,
        Some(&admin()),
        "POST",
        "/programmes",
        Some(json!({"title": "SysMO"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let programme_id = resp.json()["data"]["id"].as_str().unwrap().to_string();

    let resp = call(
        &router,
        Some(&admin()),
        "POST",
        "/projects",
        Some(json!({"title": "Yeast", "programme_id": programme_id})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let doc = resp.json();
    assert_eq!(doc["data"]["relationships"]["programme"]["data"]["id"], programme_id.as_str());
    let project_id = doc["data"]["id"].as_str().unwrap().to_string();

    let resp = call(
        &router,
        Some(&admin()),
        "POST",
        &format!("/projects/{}/members", project_id),
        Some(json!({"account_id": "gk", "role": "gatekeeper"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.json()["role"], "gatekeeper");

    let resp = call(
        &router,
        Some(&person("eve")),
        "POST",
        "/projects",
        Some(json!({"title": "Mine"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = call(&router, Some(&person("eve")), "GET", "/projects", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["meta"]["total"], 1);

    let resp = call(&router, None, "GET", "/programmes", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
