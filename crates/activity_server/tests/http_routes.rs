use activity_core::db::open_db;
use activity_server::{build_app, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    db_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("activity_tracker.db");
        open_db(&db_path).unwrap();
        Self {
            router: build_app(AppState::new(db_path.clone())),
            db_path,
            _dir: dir,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn send_json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        self.send(method, uri, Some(body.to_string())).await
    }

    async fn create(&self, uri: &str, body: Value, id_field: &str) -> i64 {
        let (status, bytes) = self.send_json(Method::POST, uri, body).await;
        assert_eq!(status, StatusCode::OK);
        let created: Value = serde_json::from_slice(&bytes).unwrap();
        created[id_field].as_i64().unwrap()
    }

    async fn get_json(&self, uri: &str) -> Value {
        let (status, bytes) = self.send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed_owner(&self) -> (i64, i64) {
        let user_id = self
            .create("/users", json!({"username": "alice", "password": "hash1"}), "user_id")
            .await;
        let activity_id = self
            .create("/activities", json!({"name": "running"}), "activity_id")
            .await;
        (user_id, activity_id)
    }
}

fn text(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::new();
    let body = app.get_json("/health").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], activity_core::core_version());
}

#[tokio::test]
async fn user_lifecycle() {
    let app = TestApp::new();

    let user_id = app
        .create("/users", json!({"username": "alice", "password": "hash1"}), "user_id")
        .await;

    let user = app.get_json(&format!("/users/{user_id}")).await;
    assert_eq!(user["id"], user_id);
    assert_eq!(user["username"], "alice");
    assert!(user.get("password").is_none());
    assert!(user["created_at"].as_i64().unwrap() > 0);

    let (status, _) = app
        .send_json(
            Method::PUT,
            &format!("/users/{user_id}"),
            json!({"id": 999, "username": "alice2", "password": "hash2"}),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.get_json(&format!("/users/{user_id}")).await["username"], "alice2");

    let (status, _) = app
        .send(Method::DELETE, &format!("/users/{user_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, bytes) = app.send(Method::GET, &format!("/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(text(&bytes), "User not found");
}

#[tokio::test]
async fn invalid_identifiers_and_bodies_are_rejected() {
    let app = TestApp::new();

    let (status, bytes) = app.send(Method::GET, "/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&bytes), "Invalid user ID");

    let (status, bytes) = app.send(Method::DELETE, "/activities/1.5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&bytes), "Invalid activity ID");

    let (status, bytes) = app.send(Method::GET, "/user-activities/x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&bytes), "Invalid user activity ID");

    let (status, bytes) = app
        .send(Method::POST, "/users", Some("{not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&bytes), "Invalid request body");

    let (status, bytes) = app
        .send_json(Method::PUT, "/activities/1", json!({"title": "wrong field"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&bytes), "Invalid request body");
}

#[tokio::test]
async fn duplicate_username_is_a_server_error() {
    let app = TestApp::new();
    app.create("/users", json!({"username": "bob", "password": "a"}), "user_id")
        .await;

    let (status, bytes) = app
        .send_json(Method::POST, "/users", json!({"username": "bob", "password": "b"}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&bytes), "Failed to create user");
}

#[tokio::test]
async fn activity_lifecycle() {
    let app = TestApp::new();

    let activity_id = app
        .create("/activities", json!({"name": "running"}), "activity_id")
        .await;
    assert_eq!(
        app.get_json(&format!("/activities/{activity_id}")).await,
        json!({"id": activity_id, "name": "running"})
    );

    let (status, _) = app
        .send_json(
            Method::PUT,
            &format!("/activities/{activity_id}"),
            json!({"name": "trail running"}),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get_json(&format!("/activities/{activity_id}")).await["name"],
        "trail running"
    );

    let (status, _) = app
        .send(Method::DELETE, &format!("/activities/{activity_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, bytes) = app
        .send(Method::GET, &format!("/activities/{activity_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(text(&bytes), "Activity not found");
}

#[tokio::test]
async fn update_and_delete_of_missing_rows_return_no_content() {
    let app = TestApp::new();

    let (status, _) = app
        .send_json(Method::PUT, "/activities/424242", json!({"name": "ghost"}))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::DELETE, "/users/424242", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn user_activity_lifecycle_with_attributes() {
    let app = TestApp::new();
    let (user_id, activity_id) = app.seed_owner().await;

    let user_activity_id = app
        .create(
            "/user-activities",
            json!({
                "user_id": user_id,
                "activity_id": activity_id,
                "start_time": 1_700_000_000_000_i64,
                "end_time": 1_700_000_600_000_i64,
                "duration_ms": 600_000,
                "mood": 4,
                "attributes": {"knee_feeling": "sore"}
            }),
            "user_activity_id",
        )
        .await;

    let uri = format!("/user-activities/{user_activity_id}");
    let loaded = app.get_json(&uri).await;
    assert_eq!(loaded["user_id"], user_id);
    assert_eq!(loaded["activity_id"], activity_id);
    assert_eq!(loaded["duration_ms"], 600_000);
    assert_eq!(loaded["mood"], 4);
    assert_eq!(loaded["attributes"], json!({"knee_feeling": "sore"}));
    let recorded_at = loaded["recorded_at"].as_i64().unwrap();
    assert!(recorded_at > 0);

    let (status, _) = app
        .send_json(
            Method::PUT,
            &uri,
            json!({
                "user_id": user_id,
                "activity_id": activity_id,
                "start_time": 1_700_000_000_000_i64,
                "end_time": 1_700_000_900_000_i64,
                "duration_ms": 900_000,
                "mood": 2,
                "recorded_at": 1,
                "attributes": {"knee_feeling": "fine", "laps": 3}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let updated = app.get_json(&uri).await;
    assert_eq!(updated["duration_ms"], 900_000);
    assert_eq!(updated["mood"], 2);
    assert_eq!(updated["recorded_at"], recorded_at);
    assert_eq!(updated["attributes"], json!({"knee_feeling": "fine", "laps": 3}));

    let (status, _) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, bytes) = app.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(text(&bytes), "User activity not found");
}

#[tokio::test]
async fn nested_attribute_values_are_an_invalid_body() {
    let app = TestApp::new();
    let (user_id, activity_id) = app.seed_owner().await;

    let (status, bytes) = app
        .send_json(
            Method::POST,
            "/user-activities",
            json!({
                "user_id": user_id,
                "activity_id": activity_id,
                "start_time": 0,
                "end_time": 0,
                "duration_ms": 0,
                "mood": 0,
                "attributes": {"knee": {"left": "sore"}}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&bytes), "Invalid request body");
}

#[tokio::test]
async fn deleting_referenced_user_is_a_server_error() {
    let app = TestApp::new();
    let (user_id, activity_id) = app.seed_owner().await;
    app.create(
        "/user-activities",
        json!({
            "user_id": user_id,
            "activity_id": activity_id,
            "start_time": 0,
            "end_time": 0,
            "duration_ms": 0,
            "mood": 3
        }),
        "user_activity_id",
    )
    .await;

    let (status, bytes) = app
        .send(Method::DELETE, &format!("/users/{user_id}"), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&bytes), "Failed to delete user");
}

#[tokio::test]
async fn user_activity_for_unknown_owner_is_a_server_error() {
    let app = TestApp::new();

    let (status, bytes) = app
        .send_json(
            Method::POST,
            "/user-activities",
            json!({
                "user_id": 77,
                "activity_id": 78,
                "start_time": 0,
                "end_time": 0,
                "duration_ms": 0,
                "mood": 0
            }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&bytes), "Failed to create user activity");
}

#[tokio::test]
async fn unreadable_stored_attributes_are_a_server_error() {
    let app = TestApp::new();
    let (user_id, activity_id) = app.seed_owner().await;
    let user_activity_id = app
        .create(
            "/user-activities",
            json!({
                "user_id": user_id,
                "activity_id": activity_id,
                "start_time": 0,
                "end_time": 0,
                "duration_ms": 0,
                "mood": 1,
                "attributes": {"knee_feeling": "sore"}
            }),
            "user_activity_id",
        )
        .await;

    open_db(&app.db_path)
        .unwrap()
        .execute(
            "UPDATE user_activities SET attributes = 'not json' WHERE id = ?1;",
            [user_activity_id],
        )
        .unwrap();

    let (status, bytes) = app
        .send(Method::GET, &format!("/user-activities/{user_activity_id}"), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&bytes), "Failed to retrieve user activity");
}

#[tokio::test]
async fn out_of_range_attribute_integer_is_an_invalid_body() {
    let app = TestApp::new();
    let (user_id, activity_id) = app.seed_owner().await;

    let body = format!(
        r#"{{"user_id":{user_id},"activity_id":{activity_id},"start_time":0,"end_time":0,"duration_ms":0,"mood":0,"attributes":{{"steps":18446744073709551615}}}}"#
    );
    let (status, bytes) = app.send(Method::POST, "/user-activities", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&bytes), "Invalid request body");
}
