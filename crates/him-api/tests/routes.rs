//! End-to-end route tests: the full router over an in-memory SQLite database.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use him_api::{auth::generate_access_token, build_router, AppState};
use him_common::config::Settings;
use him_db::Database;
use serde_json::{json, Value};
use sqlx::any::AnyPoolOptions;
use tower::ServiceExt;

const SECRET: &str = "test-signing-key";

struct TestApp {
    router: Router,
    uploads: tempfile::TempDir,
}

async fn app() -> TestApp {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let db = Database::from_pool(pool);
    db.migrate().await.unwrap();

    let uploads = tempfile::tempdir().unwrap();
    let settings = Settings::from_vars([
        ("APP_NAME", "Project HIM".to_string()),
        ("ENVIRONMENT", "test".into()),
        ("DB_TYPE", "postgresql".into()),
        ("DB_HOST", "localhost".into()),
        ("DB_PORT", "5432".into()),
        ("DB_USER", "him".into()),
        ("DB_PASSWORD", "him".into()),
        ("DB_NAME", "him".into()),
        ("SECRET_KEY", SECRET.into()),
        ("ALLOWED_ORIGINS", "http://localhost:3000".into()),
        ("UPLOAD_DIR", uploads.path().display().to_string()),
    ])
    .unwrap();

    TestApp {
        router: build_router(AppState::new(db, settings)),
        uploads,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.call(req.body(body).unwrap()).await
    }

    async fn send_as(
        &self,
        member: &Value,
        method: Method,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let member_id = member["id"].as_str().unwrap().parse().unwrap();
        let token = generate_access_token(member_id, SECRET, 600).unwrap();
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.call(req).await
    }

    async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, value) = self.send(Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri}: {value}");
        value
    }
}

fn member_body(name: &str, email: &str) -> Value {
    json!({ "full_name": name, "email": email, "role": "member" })
}

#[tokio::test]
async fn test_root_and_health() {
    let app = app().await;

    let (status, body) = app.send(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project HIM API is running");

    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_member_crud_hides_ssn() {
    let app = app().await;

    let mut body = member_body("Ann Lee", "ann@example.com");
    body["ssn"] = json!("A123456789");
    let member = app.create("/api/v1/members", body).await;
    assert!(member.get("ssn").is_none());
    let id = member["id"].as_str().unwrap().to_string();

    let (status, patched) = app
        .send(
            Method::PATCH,
            &format!("/api/v1/members/{id}"),
            Some(json!({ "address": "12 Church Rd" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["address"], "12 Church Rd");
    assert_eq!(patched["full_name"], "Ann Lee");

    let (status, _) = app.send(Method::DELETE, &format!("/api/v1/members/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.send(Method::GET, &format!("/api/v1/members/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = app().await;
    app.create("/api/v1/members", member_body("Ann", "ann@example.com")).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/members",
            Some(member_body("Other Ann", "ann@example.com")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_invalid_request_body_rejected() {
    let app = app().await;

    let (status, body) = app
        .send(Method::POST, "/api/v1/rooms", Some(json!({ "name": "", "capacity": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_membership_schema_violation_reports_path() {
    let app = app().await;
    let member = app.create("/api/v1/members", member_body("Ben", "ben@example.com")).await;
    let department = app
        .create(
            "/api/v1/departments",
            json!({
                "name": "Youth",
                "custom_fields": {
                    "type": "object",
                    "properties": { "grade": { "type": "integer" } }
                }
            }),
        )
        .await;
    let uri = format!("/api/v1/departments/{}/members", department["id"].as_str().unwrap());

    let (status, body) = app
        .send(
            Method::POST,
            &uri,
            Some(json!({ "member_id": member["id"], "additional_fields": { "grade": "ninth" } })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["path"], "/grade");

    app.create(
        &uri,
        json!({ "member_id": member["id"], "additional_fields": { "grade": 9 } }),
    )
    .await;

    let (status, list) = app
        .send(
            Method::GET,
            &format!("/api/v1/members/{}/departments", member["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], department["id"]);
}

#[tokio::test]
async fn test_enrollment_capacity_and_attendance() {
    let app = app().await;
    let a = app.create("/api/v1/members", member_body("Cy", "cy@example.com")).await;
    let b = app.create("/api/v1/members", member_body("Di", "di@example.com")).await;
    let department = app.create("/api/v1/departments", json!({ "name": "Music" })).await;
    let class = app
        .create(
            "/api/v1/classes",
            json!({
                "department_id": department["id"],
                "name": "Choir",
                "start_date": "2025-01-05",
                "end_date": "2025-03-30",
                "max_capacity": 1
            }),
        )
        .await;
    let enrollments = format!("/api/v1/classes/{}/enrollments", class["id"].as_str().unwrap());

    let enrollment = app.create(&enrollments, json!({ "member_id": a["id"] })).await;
    let (status, body) = app
        .send(Method::POST, &enrollments, Some(json!({ "member_id": b["id"] })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "LIMIT_REACHED");

    let attendance = format!(
        "{enrollments}/{}/attendance",
        enrollment["id"].as_str().unwrap()
    );
    let (status, marked) = app
        .send(
            Method::PUT,
            &attendance,
            Some(json!({ "date": "2025-01-05", "status": "present" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["attendance"]["2025-01-05"], "present");

    let (status, body) = app
        .send(
            Method::PUT,
            &attendance,
            Some(json!({ "date": "2025-01-05", "status": "sick" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    // The department still has a class, so it cannot go.
    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/departments/{}", department["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "REFERENTIAL_ERROR");
}

#[tokio::test]
async fn test_class_dates_checked_after_merge() {
    let app = app().await;
    let department = app.create("/api/v1/departments", json!({ "name": "Youth" })).await;
    let class = app
        .create(
            "/api/v1/classes",
            json!({
                "department_id": department["id"],
                "name": "Bible Study",
                "start_date": "2025-01-05",
                "end_date": "2025-03-30"
            }),
        )
        .await;

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/v1/classes/{}", class["id"].as_str().unwrap()),
            Some(json!({ "start_date": "2025-06-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = app().await;
    let member = app.create("/api/v1/members", member_body("Eve", "eve@example.com")).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "provider": "google", "provider_id": "g-42" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send_as(
            &member,
            Method::POST,
            "/api/v1/auth/identities",
            json!({ "member_id": member["id"], "provider": "google", "provider_id": "g-42" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, token) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "provider": "google", "provider_id": "g-42" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["expires_in"], 1800);
    let bearer = format!("Bearer {}", token["access_token"].as_str().unwrap());

    let (status, _) = app.send(Method::GET, "/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, bearer)
        .body(Body::empty())
        .unwrap();
    let (status, me) = app.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], member["id"]);
}

#[tokio::test]
async fn test_photo_upload_rejects_non_images() {
    let app = app().await;
    let member = app.create("/api/v1/members", member_body("Fay", "fay@example.com")).await;
    let uri = format!("/api/v1/members/{}/photo", member["id"].as_str().unwrap());

    let upload = |content_type: &str, file_name: &str| {
        let boundary = "X-HIM-BOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             not really pixels\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri(&uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    };

    let (status, _) = app.call(upload("text/plain", "notes.txt")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app.call(upload("image/png", "face.png")).await;
    assert_eq!(status, StatusCode::OK);
    let photo = updated["photo"].as_str().unwrap();
    assert!(photo.starts_with(&format!("members/{}/", member["id"].as_str().unwrap())));
    assert!(photo.ends_with(".png"));
}

#[tokio::test]
async fn test_identity_linking_requires_owner_or_leader() {
    let app = app().await;
    let eve = app.create("/api/v1/members", member_body("Eve", "eve@example.com")).await;
    let mallory = app.create("/api/v1/members", member_body("Mal", "mal@example.com")).await;
    let mut leader_body = member_body("Lee", "lee@example.com");
    leader_body["role"] = json!("leader");
    let leader = app.create("/api/v1/members", leader_body).await;

    let link = |provider_id: &str| {
        json!({ "member_id": eve["id"], "provider": "google", "provider_id": provider_id })
    };

    let (status, body) = app
        .send(Method::POST, "/api/v1/auth/identities", Some(link("g-mal")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, body) = app
        .send_as(&mallory, Method::POST, "/api/v1/auth/identities", link("g-mal"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    // The failed attempt left nothing to sign in with.
    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "provider": "google", "provider_id": "g-mal" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, identity) = app
        .send_as(&leader, Method::POST, "/api/v1/auth/identities", link("g-eve"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let unlink = format!("/api/v1/auth/identities/{}", identity["id"].as_str().unwrap());
    let (status, _) = app.send_as(&mallory, Method::DELETE, &unlink, Value::Null).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send_as(&eve, Method::DELETE, &unlink, Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_malformed_input_gets_json_errors() {
    let app = app().await;

    let mut body = member_body("Gil", "gil@example.com");
    body["role"] = json!("bishop");
    let (status, body) = app.send(Method::POST, "/api/v1/members", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/rooms")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, body) = app.send(Method::GET, "/api/v1/members/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, body) = app.send(Method::GET, "/api/v1/rooms?limit=many", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_membership_patch_keeps_or_clears_fields() {
    let app = app().await;
    let member = app.create("/api/v1/members", member_body("Hal", "hal@example.com")).await;
    let department = app.create("/api/v1/departments", json!({ "name": "Choir" })).await;
    let memberships = format!("/api/v1/departments/{}/members", department["id"].as_str().unwrap());
    let membership = app
        .create(
            &memberships,
            json!({ "member_id": member["id"], "additional_fields": { "voice": "tenor" } }),
        )
        .await;
    let uri = format!("{memberships}/{}", membership["id"].as_str().unwrap());

    let (status, kept) = app.send(Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["additional_fields"], json!({ "voice": "tenor" }));

    let (status, cleared) = app
        .send(Method::PATCH, &uri, Some(json!({ "additional_fields": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["additional_fields"].is_null());
}

#[tokio::test]
async fn test_photo_for_missing_member_leaves_no_file() {
    let app = app().await;
    let missing = uuid::Uuid::now_v7();

    let boundary = "X-HIM-BOUNDARY";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"face.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         not really pixels\r\n\
         --{boundary}--\r\n"
    );
    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/members/{missing}/photo"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = app.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let dir = app.uploads.path().join("members").join(missing.to_string());
    let leftover = std::fs::read_dir(&dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftover, 0);
}
