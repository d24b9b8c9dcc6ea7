use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::AppConfig;
use service::EmployeesFacade;

struct TestApp {
    app: Router,
    employees: Arc<EmployeesFacade>,
    admin: String,
}

async fn build_app() -> anyhow::Result<TestApp> {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    let state = server::build_state(&cfg, "memory").await?;
    let employees = Arc::clone(&state.employees);
    let app = server::build_app(state);

    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": "admin@tel-ran.com", "password": "Admin12345"}).to_string()))?;
    let body = read_json(app.clone().oneshot(req).await?).await?;
    let admin = body["accessToken"].as_str().unwrap_or_default().to_string();
    Ok(TestApp { app, employees, admin })
}

async fn read_json(resp: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.admin));
        let req = match body {
            Some(v) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(v.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        Ok((status, read_json(resp).await?))
    }
}

fn employee(department: &str) -> Value {
    json!({
        "fullName": "Ann Lee",
        "avatar": "https://example.com/ann.png",
        "department": department,
        "birthDate": "1990-05-20",
        "salary": 12000
    })
}

#[tokio::test]
async fn crud_round_trip() -> anyhow::Result<()> {
    let t = build_app().await?;

    let (status, created) = t.send("POST", "/employees", Some(employee("QA"))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap_or_default().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["fullName"], "Ann Lee");

    let (status, fetched) = t.send("GET", &format!("/employees/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    t.send("POST", "/employees", Some(employee("Development"))).await?;
    let (_, qa) = t.send("GET", "/employees?department=QA", None).await?;
    assert_eq!(qa.as_array().map(Vec::len), Some(1));
    let (_, all) = t.send("GET", "/employees", None).await?;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
    let (_, none) = t.send("GET", "/employees?department=kuku", None).await?;
    assert_eq!(none, json!([]));

    let (status, updated) = t.send("PATCH", &format!("/employees/{id}"), Some(json!({"salary": 30000}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["salary"], 30000);
    assert_eq!(updated["fullName"], created["fullName"]);
    assert_eq!(updated["birthDate"], created["birthDate"]);

    let (status, deleted) = t.send("DELETE", &format!("/employees/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, updated);

    let (status, body) = t.send("GET", &format!("/employees/{id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["name"], "NotFoundError");
    assert_eq!(body["error"]["message"], format!("Employee with id {id} not found"));
    assert_eq!(body["error"]["status"], 404);
    Ok(())
}

#[tokio::test]
async fn duplicate_id_conflicts() -> anyhow::Result<()> {
    let t = build_app().await?;
    let mut body = employee("Audit");
    body["id"] = json!("6f1c2a9e-8d3b-4c5a-9e7f-1a2b3c4d5e6f");
    assert_eq!(t.send("POST", "/employees", Some(body.clone())).await?.0, StatusCode::CREATED);
    let (status, err) = t.send("POST", "/employees", Some(body)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["name"], "AlreadyExistsError");
    Ok(())
}

#[tokio::test]
async fn invalid_payloads_are_rejected() -> anyhow::Result<()> {
    let t = build_app().await?;

    let mut bad = employee("kuku");
    bad["salary"] = json!(1);
    let (status, err) = t.send("POST", "/employees", Some(bad)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["name"], "ValidationError");
    let msg = err["error"]["message"].as_str().unwrap_or_default();
    assert!(msg.contains("Department") && msg.contains("Salary"), "{msg}");

    let (status, _) = t.send("POST", "/employees", Some(json!({"fullName": "No Fields"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, created) = t.send("POST", "/employees", Some(employee("QA"))).await?;
    let uri = format!("/employees/{}", created["id"].as_str().unwrap_or_default());
    let (status, err) = t.send("PATCH", &uri, Some(json!({"id": "other"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["name"], "ValidationError");
    let (status, _) = t.send("PATCH", &uri, Some(json!({"birthDate": "2020-01-01"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_ids_are_not_found() -> anyhow::Result<()> {
    let t = build_app().await?;
    assert_eq!(t.send("PATCH", "/employees/missing", Some(json!({"salary": 20000}))).await?.0, StatusCode::NOT_FOUND);
    assert_eq!(t.send("DELETE", "/employees/missing", None).await?.0, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn closed_backend_is_internal_error() -> anyhow::Result<()> {
    let t = build_app().await?;
    t.employees.save().await?;
    let (status, body) = t.send("GET", "/employees", None).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["name"], "InternalError");
    assert_eq!(body["error"]["message"], "Internal server error");
    Ok(())
}
