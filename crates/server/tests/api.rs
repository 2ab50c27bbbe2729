use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{Engine, Role};
use migration::MigratorTrait;
use server::{ServerConfig, ServerState, router};

struct TestApp {
    router: Router,
    state: ServerState,
}

async fn test_app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let config = ServerConfig {
        jwt_secret: "test-secret".to_string(),
        token_ttl: chrono::Duration::hours(1),
        uploads_dir: std::env::temp_dir().join(format!("tally_api_{}", Uuid::new_v4())),
    };
    let state = ServerState::new(engine, &config);
    TestApp {
        router: router(state.clone()),
        state,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Register and log in, returning the bearer token.
    async fn login(&self, name: &str) -> String {
        let email = format!("{name}@example.com");
        let (status, _) = self
            .json(
                Method::POST,
                "/api/users/register",
                None,
                json!({ "username": name, "email": email, "password": "password" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .json(
                Method::POST,
                "/api/users/login",
                None,
                json!({ "email": email, "password": "password" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn login_admin(&self, name: &str) -> String {
        let token = self.login(name).await;
        self.state
            .engine
            .assign_role(&format!("{name}@example.com"), Role::Admin)
            .await
            .unwrap();
        token
    }
}

#[tokio::test]
async fn auth_gate_outcomes() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/api/budget")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "MissingCredential");

    let (status, body) = app.get("/api/budget", "garbage").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "InvalidCredential");

    let ghost = app.state.tokens.issue(Uuid::new_v4()).unwrap();
    let (status, body) = app.get("/api/budget", &ghost).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UnknownUser");

    let token = app.login("alice").await;
    let (status, body) = app.get("/api/users/verify", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn login_failures() {
    let app = test_app().await;
    app.login("alice").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/users/login",
            None,
            json!({ "email": "alice@example.com", "password": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "InvalidCredentials");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/users/register",
            None,
            json!({ "username": "alice", "email": "alice@example.com", "password": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "AlreadyExists");
}

#[tokio::test]
async fn budget_flow_over_http() {
    let app = test_app().await;
    let token = app.login("alice").await;

    let (status, body) = app.get("/api/budget", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NoBudgetFound");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/budget/deposit",
            Some(&token),
            json!({ "depositAmount": 100 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalBudget"], 100.0);
    assert_eq!(body["remainingBudget"], 100.0);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/budget/expense",
            Some(&token),
            json!({ "expenseAmount": 30.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usedBudget"], 30.5);
    assert_eq!(body["remainingBudget"], 69.5);
    assert_eq!(body["utilizationPercentage"], 31);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/budget/expense",
            Some(&token),
            json!({ "expenseAmount": 80 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InsufficientBudget");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/budget/deposit",
            Some(&token),
            json!({ "depositAmount": "lots" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidAmount");

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/budget",
            Some(&token),
            json!({ "totalBudget": 10, "usedBudget": 20 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "InvariantViolation");

    let (_, body) = app.get("/api/budget", &token).await;
    assert_eq!(body["totalBudget"], 100.0);
    assert_eq!(body["usedBudget"], 30.5);

    let (status, _) = app
        .json(Method::DELETE, "/api/budget", Some(&token), Value::Null)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn expenses_are_scoped_and_reviewed_by_admins() {
    let app = test_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;
    let admin = app.login_admin("root").await;

    let (status, created) = app
        .json(
            Method::POST,
            "/api/expenses",
            Some(&alice),
            json!({ "name": "Lunch", "amount": 12.5, "category": "food" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["category"], "Food");
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app.get(&format!("/api/expenses/{id}"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, totals) = app.get("/api/expenses/total", &alice).await;
    assert_eq!(totals["totalAmount"], 12.5);
    assert_eq!(totals["totalCount"], 1);

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/api/admin/expenses/{id}/approve"),
            Some(&alice),
            Value::Null,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reviewed) = app
        .json(
            Method::POST,
            &format!("/api/admin/expenses/{id}/approve"),
            Some(&admin),
            Value::Null,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "approved");
    assert!(reviewed["reviewedBy"].is_string());

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/api/expenses/{id}"),
            Some(&alice),
            json!({ "amount": 20 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");

    let (status, body) = app
        .json(Method::DELETE, "/api/expenses", Some(&alice), Value::Null)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);
}

#[tokio::test]
async fn admin_dashboard_requires_role() {
    let app = test_app().await;
    let alice = app.login("alice").await;
    let admin = app.login_admin("root").await;

    let (status, _) = app.get("/api/admin/stats", &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = app.get("/api/admin/stats", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 2);

    let (status, report) = app
        .get("/api/admin/reports/expenses?range=thisMonth", &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(report.as_array().unwrap().is_empty());

    let (status, _) = app
        .get("/api/admin/reports/expenses?range=someday", &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, activity) = app.get("/api/admin/activities", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity[0]["type"], "user");
}

#[tokio::test]
async fn contact_form_is_public() {
    let app = test_app().await;
    let admin = app.login_admin("root").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/contact",
            None,
            json!({ "name": "Visitor", "email": "v@example.com", "message": "Hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, contacts) = app.get("/api/admin/contacts", &admin).await;
    assert_eq!(contacts.as_array().unwrap().len(), 1);
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn receipt_upload_and_image_serving() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let boundary = "tally-boundary";

    let body = multipart_body(
        boundary,
        &[("receiptName", "Groceries"), ("amount", "42.10"), ("date", "2025-03-14")],
        Some(("scan.png", b"fake-png")),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/receipts")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, receipt) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["receiptName"], "Groceries");
    assert_eq!(receipt["amount"], 42.1);
    assert_eq!(receipt["date"], "2025-03-14");

    let image_url = receipt["imageUrl"].as_str().unwrap().to_string();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&image_url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"fake-png");

    let body = multipart_body(boundary, &[("receiptName", "Groceries"), ("amount", "-1"), ("date", "2025-03-14")], None);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/receipts")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidAmount");

    let (_, totals) = app.get("/api/receipts/total", &token).await;
    assert_eq!(totals["totalCount"], 1);

    let id = receipt["id"].as_str().unwrap();
    let (status, _) = app
        .json(Method::DELETE, &format!("/api/receipts/{id}"), Some(&token), Value::Null)
        .await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&image_url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_bodies_answer_with_error_body() {
    let app = test_app().await;
    let token = app.login("alice").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/budget/deposit")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"depositAmount": "#))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "BadRequest");
    assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users/register")
        .body(Body::from(r#"{"username":"bob"}"#))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "BadRequest");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/budget/deposit",
            Some(&token),
            json!({ "depositAmount": "10,5" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidAmount");
}

#[tokio::test]
async fn missing_or_unparsable_dates_are_validation_errors() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let boundary = "tally-boundary";

    let body = multipart_body(boundary, &[("receiptName", "Groceries"), ("amount", "42.10")], None);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/receipts")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");

    let body = multipart_body(
        boundary,
        &[("receiptName", "Groceries"), ("amount", "42.10"), ("date", "14/03/2025")],
        None,
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/receipts")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/expenses",
            Some(&token),
            json!({ "name": "Lunch", "amount": 12, "date": "14/03/2025" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");

    let (_, receipts) = app.get("/api/receipts", &token).await;
    assert_eq!(receipts.as_array().map(Vec::len), Some(0));
}
