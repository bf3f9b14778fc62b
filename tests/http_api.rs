//! HTTP API tests: routing, authentication, status codes and response bodies

mod common;

use axum::Router;
use axum::http::StatusCode;
use common::*;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    _db: TestDb,
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let db = setup_test_db();
        let state = create_test_state(db.store.clone());
        let router = handlers::app(state.clone());
        Self {
            _db: db,
            state,
            router,
        }
    }

    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(json_request(method, uri, token, body))
            .await
            .unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn token_for(&self, app: &CreatedApplication) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/auth/token",
                None,
                Some(json!({
                    "api_key": app.application.api_key,
                    "api_secret": app.api_secret,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_token_exchange() {
    let app = TestApp::new();
    let created = create_test_application(&app.state, "Acme").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/auth/token",
            None,
            Some(json!({
                "api_key": created.application.api_key,
                "api_secret": created.api_secret,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/auth/token",
            None,
            Some(json!({
                "api_key": created.application.api_key,
                "api_secret": "nope",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = TestApp::new();

    let (status, _) = app.send("GET", "/api/v1/licenses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send("GET", "/api/v1/clients", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_rejected_after_application_deleted() {
    let app = TestApp::new();
    let created = create_test_application(&app.state, "Acme").await;
    let token = app.token_for(&created).await;

    let uri = format!("/api/v1/applications/{}", created.application.id);
    let (status, _) = app.send("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_license_flow() {
    let app = TestApp::new();
    let created = create_test_application(&app.state, "Acme").await;
    let token = app.token_for(&created).await;
    let token = Some(token.as_str());

    let (status, lt) = app
        .send(
            "POST",
            "/api/v1/license-types",
            token,
            Some(json!({
                "name": "Pro",
                "duration_days": 30,
                "price": 19.99,
                "features": {"seats": 3, "sso": true}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, client) = app
        .send(
            "POST",
            "/api/v1/clients",
            token,
            Some(json!({"name": "Jane", "email": "jane@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, license) = app
        .send(
            "POST",
            "/api/v1/licenses",
            token,
            Some(json!({"license_type_id": lt["id"], "client_id": client["id"]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(license["is_active"], true);
    assert_eq!(license["usage_limits"]["seats"], 3);
    let key = license["license_key"].as_str().unwrap().to_string();
    let license_id = license["id"].as_str().unwrap().to_string();

    // Validation is public
    let (status, result) = app
        .send("POST", "/api/v1/validate", None, Some(json!({"license_key": key})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["valid"], true);
    assert_eq!(result["message"], "License validated successfully");
    assert_eq!(result["features"]["sso"], true);
    assert!(result["expires_at"].is_string());

    // Usage within and over the limit
    let (status, body) = app
        .send(
            "POST",
            "/api/v1/usage",
            None,
            Some(json!({"license_key": key, "usage": {"seats": 2}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/usage",
            None,
            Some(json!({"license_key": key, "usage": {"seats": 4}})),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["details"], "seats");

    // Revoke, then validation fails with the same body shape
    let (status, revoked) = app
        .send(
            "POST",
            &format!("/api/v1/licenses/{}/revoke", license_id),
            token,
            Some(json!({"reason": "refund"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revoked["is_revoked"], true);
    assert_eq!(revoked["is_active"], false);
    assert_eq!(revoked["revocation_reason"], "refund");

    let (status, result) = app
        .send("POST", "/api/v1/validate", None, Some(json!({"license_key": key})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(result["valid"], false);
    assert_eq!(result["message"], "License has been revoked");

    let (status, activities) = app
        .send(
            "GET",
            &format!("/api/v1/licenses/{}/activities", license_id),
            token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = activities
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["activity_type"].as_str().unwrap())
        .collect();
    // Every usage report validates first, including the rejected one
    assert_eq!(
        types,
        vec!["revocation", "validation", "usage", "validation", "validation", "creation"]
    );
}

#[tokio::test]
async fn test_validate_unknown_key_is_forbidden() {
    let app = TestApp::new();
    let (status, body) = app
        .send("POST", "/api/v1/validate", None, Some(json!({"license_key": "missing"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "License not found");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app
        .send("POST", "/api/v1/validate", None, Some(json!({"key": 1})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
}

#[tokio::test]
async fn test_malformed_query_is_bad_request() {
    let app = TestApp::new();
    let created = create_test_application(&app.state, "Acme").await;
    let token = app.token_for(&created).await;

    let (status, body) = app
        .send("GET", "/api/v1/licenses?is_revoked=maybe", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let app = TestApp::new();
    let f = create_fixture(&app.state, json!({})).await;
    let intruder = create_test_application(&app.state, "Intruder").await;
    let token = app.token_for(&intruder).await;
    let token = Some(token.as_str());

    let (status, _) = app
        .send("GET", &format!("/api/v1/licenses/{}", f.license.id), token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "GET",
            &format!("/api/v1/licenses/by-key/{}", f.license.license_key),
            token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/v1/licenses/{}/revoke", f.license.id),
            token,
            Some(json!({"reason": "mischief"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("GET", &format!("/api/v1/clients/{}", f.client.id), token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "GET",
            &format!("/api/v1/applications/{}", f.app.application.id),
            token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = app.send("GET", "/api/v1/licenses", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    let (status, list) = app.send("GET", "/api/v1/applications", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], intruder.application.id.as_str());

    let stored = app.state.engine.get_by_id(&ctx(), &f.license.id).await.unwrap();
    assert!(!stored.is_revoked);
}

#[tokio::test]
async fn test_reactivating_revoked_license_conflicts() {
    let app = TestApp::new();
    let f = create_fixture(&app.state, json!({})).await;
    let token = app.token_for(&f.app).await;
    let token = Some(token.as_str());
    app.state
        .engine
        .revoke(&ctx(), &f.license.id, "fraud")
        .await
        .unwrap();

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/v1/licenses/{}", f.license.id),
            token,
            Some(json!({"is_active": true})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn test_list_licenses_with_filters() {
    let app = TestApp::new();
    let f = create_fixture(&app.state, json!({})).await;
    let token = app.token_for(&f.app).await;
    let token = Some(token.as_str());

    let (status, list) = app
        .send(
            "GET",
            &format!("/api/v1/licenses?client_id={}&is_revoked=false", f.client.id),
            token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, list) = app
        .send("GET", "/api/v1/licenses?is_revoked=true", token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    let (status, list) = app
        .send(
            "GET",
            &format!("/api/v1/clients/{}/licenses", f.client.id),
            token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], f.license.id.as_str());
}
