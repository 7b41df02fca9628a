//! HTTP-level tests driving the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use ebloodbank_gateway::GatewayBuilder;
use ebloodbank_server::api::{AppState, router};
use ebloodbank_server::auth::api_key::hash_api_key;
use ebloodbank_server::auth::config::AuthFileConfig;
use ebloodbank_server::auth::password::hash_password;
use ebloodbank_server::auth::{AuthProvider, mirror_directory};
use ebloodbank_store_memory::MemoryStore;

const CITY_KEY: &str = "city-bank-key";
const RURAL_KEY: &str = "rural-bank-key";
const ASHA_KEY: &str = "asha-key";

async fn app() -> Router {
    let auth_toml = format!(
        r#"
        [settings]
        jwt_secret = "test-secret"

        [[users]]
        username = "cityblood"
        password_hash = "{pw}"
        kind = "bloodbank"
        account_id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c01"

        [users.bank]
        id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c02"
        name = "City Blood Bank"
        city = "Pune"

        [[users]]
        username = "ruralblood"
        password_hash = "{pw}"
        kind = "bloodbank"
        account_id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c03"

        [users.bank]
        id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c04"
        name = "Rural Blood Bank"
        city = "Satara"

        [[users]]
        username = "asha"
        password_hash = "{pw}"
        kind = "requester"
        account_id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c05"
        email = "asha@example.org"

        [[api_keys]]
        name = "city"
        key_hash = "{city}"
        username = "cityblood"

        [[api_keys]]
        name = "rural"
        key_hash = "{rural}"
        username = "ruralblood"

        [[api_keys]]
        name = "asha"
        key_hash = "{asha}"
        username = "asha"
        "#,
        pw = hash_password("s3cret").unwrap(),
        city = hash_api_key(CITY_KEY),
        rural = hash_api_key(RURAL_KEY),
        asha = hash_api_key(ASHA_KEY),
    );
    let auth_config: AuthFileConfig = toml::from_str(&auth_toml).unwrap();
    auth_config.validate().unwrap();

    let gateway = Arc::new(
        GatewayBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap(),
    );
    mirror_directory(&auth_config, &gateway).await.unwrap();
    let provider = AuthProvider::new(&auth_config, Arc::clone(&gateway)).unwrap();

    router(AppState {
        gateway,
        auth: Some(Arc::new(provider)),
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    call(app, request).await
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    into_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn new_request() -> Value {
    json!({
        "patient_name": "Ravi Kumar",
        "blood_group": "O+",
        "units_required": 2,
        "urgency": "emergency",
        "required_date": "2026-10-25",
        "hospital_name": "Sassoon General",
        "doctor_name": "Dr. Mehta",
        "contact_number": "9822012345"
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_credentials() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/v1/requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing authentication credentials");

    let (status, _) = send(&app, "GET", "/v1/requests", Some("wrong"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn approval_is_first_bank_wins() {
    let app = app().await;
    let (status, created) =
        send(&app, "POST", "/v1/requests", Some(ASHA_KEY), Some(new_request())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_str().unwrap().to_owned();

    let approve = format!("/v1/requests/{id}/approve");
    let (status, approved) = send(&app, "POST", &approve, Some(CITY_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["bloodbank"], "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c02");

    let (status, body) = send(&app, "POST", &approve, Some(RURAL_KEY), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("already approved by another blood bank")
    );

    let (status, current) =
        send(&app, "GET", &format!("/v1/requests/{id}"), Some(ASHA_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current, approved);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let app = app().await;
    let mut body = new_request();
    body["units_required"] = json!(0);
    let (status, body) = send(&app, "POST", "/v1/requests", Some(ASHA_KEY), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "units_required");
}

#[tokio::test]
async fn operators_cannot_create_requests() {
    let app = app().await;
    let (status, _) =
        send(&app, "POST", "/v1/requests", Some(CITY_KEY), Some(new_request())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn donation_credits_inventory() {
    let app = app().await;
    let donation = json!({
        "email": "asha@example.org",
        "blood_group": "A+",
        "units_donated": 2,
        "donation_date": "2026-10-18",
        "hemoglobin_level": 13.9,
        "verified_by": "Nurse Pillai"
    });
    let (status, recorded) =
        send(&app, "POST", "/v1/donations", Some(CITY_KEY), Some(donation)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(recorded["inventory"]["units_available"], 2);
    assert_eq!(recorded["inventory"]["blood_group"], "A+");

    let (status, stock) =
        send(&app, "GET", "/v1/inventory?blood_group=a%2B", Some(CITY_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock["total"], 1);
    assert_eq!(stock["inventory"][0]["units_available"], 2);
    assert_eq!(stock["inventory"][0]["is_low_stock"], true);

    let donor = recorded["donation"]["donor"].as_str().unwrap();
    let (status, donor) =
        send(&app, "GET", &format!("/v1/donors/{donor}"), Some(ASHA_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(donor["last_donation_date"], "2026-10-18");
}

#[tokio::test]
async fn negative_stock_is_rejected() {
    let app = app().await;
    let body = json!({ "blood_group": "B-", "units_available": -3 });
    let (status, body) = send(&app, "PUT", "/v1/inventory", Some(CITY_KEY), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "units_available");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = app().await;
    let login = json!({ "username": "asha", "password": "s3cret" });
    let (status, body) = send(&app, "POST", "/v1/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();

    let bearer = |method: &str, uri: &str| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = call(&app, bearer("GET", "/v1/requests")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, bearer("POST", "/v1/auth/logout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "logged_out");
    let (status, body) = call(&app, bearer("GET", "/v1/requests")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token has been revoked");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app().await;
    let login = json!({ "username": "asha", "password": "nope" });
    let (status, body) = send(&app, "POST", "/v1/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let app = app().await;
    let uri = format!("/v1/requests/{}", uuid::Uuid::now_v7());
    let (status, body) = send(&app, "GET", &uri, Some(CITY_KEY), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("not found"));
}
