//! 메모리 저장소를 붙인 전체 라우터를 통한 요청 흐름 테스트.

use std::sync::Arc;

use assetdesk_api::auth::RejectReason;
use assetdesk_api::{create_app, AppState, IdentityClaim, MemoryStore, TokenService, UserRepository};
use assetdesk_core::{NewUser, Role};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-with-enough-length";

struct Harness {
    app: Router,
    state: Arc<AppState>,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(&SecretString::from(SECRET.to_string()), Duration::hours(24));
        let state = Arc::new(AppState::with_memory_store(store.clone(), tokens));
        Self {
            app: create_app(state.clone(), None),
            state,
            store,
        }
    }

    fn bearer(&self, id: i64, role: Role) -> String {
        let token = self
            .state
            .tokens
            .issue(&IdentityClaim::new(id, format!("user{id}@example.com"), role))
            .unwrap();
        format!("Bearer {token}")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn post_json(&self, uri: &str, body: Value, auth: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn call(&self, method: Method, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)]) -> Body {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    Body::from(body)
}

#[tokio::test]
async fn test_register_then_login_then_list_users() {
    let h = Harness::new();

    let (status, json) = h
        .post_json(
            "/api/auth/register",
            json!({"name": "Kim", "email": "Kim@Example.com", "password": "hunter22"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"]["email"], "kim@example.com");
    assert_eq!(json["user"]["role"], "USER");

    let (status, json) = h
        .post_json(
            "/api/auth/login",
            json!({"email": "kim@example.com", "password": "hunter22"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = json["token"].as_str().unwrap().to_string();

    let claim = h.state.tokens.verify(&token).unwrap();
    assert_eq!(claim.email, "kim@example.com");
    assert_eq!(claim.role, Role::User);

    let (status, json) = h
        .call(Method::GET, "/api/users", Some(&format!("Bearer {token}")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert!(json["users"][0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_missing_required_field_never_reaches_store() {
    let h = Harness::new();

    let (status, json) = h
        .post_json(
            "/api/auth/register",
            json!({"name": "Kim", "email": "kim@example.com", "password": "   "}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Name, email, and password are required"}));

    let (status, json) = h
        .post_json("/api/auth/login", json!({"email": "kim@example.com"}), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Email and password are required"}));

    assert_eq!(h.store.calls().total(), 0);
}

#[tokio::test]
async fn test_issued_token_verifies_until_expiry() {
    let h = Harness::new();
    let claim = IdentityClaim::new(3, "lee@example.com", Role::Admin);
    let issued_at = Utc::now();
    let token = h.state.tokens.issue_at(&claim, issued_at).unwrap();

    let first = h.state.tokens.verify_at(&token, issued_at).unwrap();
    let second = h.state.tokens.verify_at(&token, issued_at).unwrap();
    assert_eq!(first, claim);
    assert_eq!(first, second);

    let just_before = issued_at + Duration::hours(24) - Duration::seconds(1);
    assert!(h.state.tokens.verify_at(&token, just_before).is_ok());

    let expired = h
        .state
        .tokens
        .verify_at(&token, issued_at + Duration::hours(24))
        .unwrap_err();
    assert_eq!(expired.reason, RejectReason::Expired);
}

#[tokio::test]
async fn test_non_admin_asset_mutation_is_forbidden() {
    let h = Harness::new();
    let bearer = h.bearer(5, Role::User);

    for method in [Method::POST, Method::PUT, Method::DELETE] {
        let (status, json) = h.call(method.clone(), "/api/assets?id=1", Some(&bearer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method}");
        assert_eq!(json, json!({"error": "Admin access required"}));
    }

    let (status, _) = h.call(Method::GET, "/api/assets", Some(&bearer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.store.calls().users, 0);
}

#[tokio::test]
async fn test_missing_bearer_is_unauthenticated() {
    let h = Harness::new();

    for (method, uri) in [
        (Method::GET, "/api/users"),
        (Method::GET, "/api/assets"),
        (Method::DELETE, "/api/users/1"),
    ] {
        let (status, json) = h.call(method, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(json, json!({"error": "Authentication required"}));
    }

    let (status, json) = h
        .call(Method::GET, "/api/users", Some("Bearer garbage.token.value"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, json!({"error": "Authentication required"}));
    assert_eq!(h.store.calls().total(), 0);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let h = Harness::new();
    h.post_json(
        "/api/auth/register",
        json!({"name": "Kim", "email": "kim@example.com", "password": "hunter22"}),
        None,
    )
    .await;

    let (status, unknown) = h
        .post_json(
            "/api/auth/login",
            json!({"email": "nobody@example.com", "password": "hunter22"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, json!({"error": "Invalid credentials"}));

    let (status, wrong) = h
        .post_json(
            "/api/auth/login",
            json!({"email": "kim@example.com", "password": "hunter23"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let h = Harness::new();
    let body = json!({"name": "Kim", "email": "kim@example.com", "password": "hunter22"});

    let (status, _) = h.post_json("/api/auth/register", body.clone(), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = h.post_json("/api/auth/register", body, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json, json!({"error": "Email already registered"}));
}

#[tokio::test]
async fn test_user_pagination_over_twelve_records() {
    let h = Harness::new();
    for i in 1..=12 {
        UserRepository::create(
            h.store.as_ref(),
            NewUser {
                name: format!("User {i:02}"),
                email: format!("user{i:02}@example.com"),
                password_hash: None,
                role: Role::User,
                is_active: true,
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();
    }
    let bearer = h.bearer(1, Role::Admin);

    let (status, json) = h
        .call(Method::GET, "/api/users?page=2&limit=5", Some(&bearer))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["users"].as_array().unwrap().len(), 5);
    assert_eq!(json["total"], 12);
    assert_eq!(json["page"], 2);
    assert_eq!(json["totalPages"], 3);
    assert_eq!(json["users"][0]["name"], "User 06");

    let (_, json) = h
        .call(Method::GET, "/api/users?page=3&limit=5", Some(&bearer))
        .await;
    assert_eq!(json["users"].as_array().unwrap().len(), 2);

    // 기본 limit은 5
    let (_, json) = h.call(Method::GET, "/api/users", Some(&bearer)).await;
    assert_eq!(json["users"].as_array().unwrap().len(), 5);
    assert_eq!(json["totalPages"], 3);
}

#[tokio::test]
async fn test_asset_without_name_is_rejected() {
    let h = Harness::new();
    let bearer = h.bearer(1, Role::Admin);
    let boundary = "flow-boundary";

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/assets")
        .header(header::AUTHORIZATION, &bearer)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(multipart_body(boundary, &[("name", "  "), ("type", "Laptop")]))
        .unwrap();
    let (status, json) = h.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Asset name is required"}));
    assert_eq!(h.store.calls().total(), 0);

    let (_, json) = h.call(Method::GET, "/api/assets", Some(&bearer)).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_deleting_missing_user_is_not_found() {
    let h = Harness::new();
    let bearer = h.bearer(1, Role::Admin);

    let (status, json) = h.call(Method::DELETE, "/api/users/404", Some(&bearer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"error": "User not found"}));
    assert_eq!(h.store.calls().users, 1);
}

#[tokio::test]
async fn test_updating_missing_user_with_taken_email_is_not_found() {
    let h = Harness::new();
    h.post_json(
        "/api/auth/register",
        json!({"name": "Kim", "email": "kim@example.com", "password": "hunter22"}),
        None,
    )
    .await;
    let bearer = h.bearer(1, Role::Admin);

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/users/999")
        .header(header::AUTHORIZATION, &bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": "kim@example.com"}).to_string()))
        .unwrap();
    let (status, json) = h.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"error": "User not found"}));
}

#[tokio::test]
async fn test_oversized_pagination_is_rejected() {
    let h = Harness::new();
    let bearer = h.bearer(1, Role::User);

    for uri in [
        "/api/users?page=4294967295&limit=4294967295",
        "/api/assets?page=4294967295&limit=4294967295",
    ] {
        let (status, json) = h.call(Method::GET, uri, Some(&bearer)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json, json!({"error": "Invalid pagination parameters"}));
    }
    assert_eq!(h.store.calls().total(), 0);
}
