// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! End-to-end tests of the real HTTP transport and session against an
//! in-process fake Freebox.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use freebox_exporter::freebox::{REFRESH_DEBOUNCE, derive_password, identity::APP_ID};
use freebox_exporter::{
    AppError, ApplicationIdentity, Config, HttpTransport, IdentityOverrides, MetricsRegistry,
    RetryConfig, Session, Transport, TransportOptions, collect_once,
};
use secrecy::SecretString;
use serde_json::{Value, json};

const APP_TOKEN: &str = "dyxZKXGu8hv7Mxh5VvLGAE8u4mPRSgNFW";

#[derive(Default)]
struct Device {
    challenges: AtomicUsize,
    sessions: AtomicUsize,
    last_challenge: Mutex<String>,
    valid_token: Mutex<Option<String>>,
    seen_tokens: Mutex<Vec<String>>,
}

impl Device {
    fn expire_session(&self) {
        *self.valid_token.lock().unwrap() = None;
    }
}

fn ok(result: Value) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "result": result })),
    )
}

fn api_error(status: StatusCode, code: &str, msg: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "success": false, "error_code": code, "msg": msg })),
    )
}

async fn login(State(device): State<Arc<Device>>) -> (StatusCode, Json<Value>) {
    let n = device.challenges.fetch_add(1, Ordering::SeqCst) + 1;
    let challenge = format!("VzhbtpR4r8CLaJle2QgJBEkyd8JPb0zL{n}");
    *device.last_challenge.lock().unwrap() = challenge.clone();
    ok(json!({ "logged_in": false, "challenge": challenge }))
}

async fn open_session(
    State(device): State<Arc<Device>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let challenge = device.last_challenge.lock().unwrap().clone();
    let expected =
        derive_password(&SecretString::from(APP_TOKEN.to_string()), &challenge).unwrap();
    if body["app_id"] != APP_ID || body["password"] != expected.as_str() {
        return api_error(StatusCode::FORBIDDEN, "invalid_token", "Invalid password");
    }

    let n = device.sessions.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("session-{n}");
    *device.valid_token.lock().unwrap() = Some(token.clone());
    ok(json!({ "session_token": token, "challenge": challenge, "permissions": {} }))
}

async fn connection(
    State(device): State<Arc<Device>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let Some(token) = headers
        .get("X-Fbx-App-Auth")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
    else {
        return api_error(StatusCode::FORBIDDEN, "auth_required", "Auth required");
    };
    device.seen_tokens.lock().unwrap().push(token.clone());

    if device.valid_token.lock().unwrap().as_deref() != Some(token.as_str()) {
        return api_error(StatusCode::FORBIDDEN, "invalid_token", "Invalid session token");
    }
    ok(json!({ "state": "up", "bytes_down": 1_234_567 }))
}

async fn denied() -> (StatusCode, Json<Value>) {
    api_error(
        StatusCode::FORBIDDEN,
        "insufficient_rights",
        "Your app permissions does not allow accessing this API",
    )
}

async fn bad_gateway() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "Bad Gateway")
}

async fn html() -> &'static str {
    "<html>not json</html>"
}

/// Starts the fake device and returns its API base URL
async fn spawn_device(device: Arc<Device>) -> String {
    let app = Router::new()
        .route("/api/v8/login/", get(login))
        .route("/api/v8/login/session/", post(open_session))
        .route("/api/v8/connection/", get(connection))
        .route("/api/v8/system/", get(connection))
        .route("/api/v8/denied/", get(denied))
        .route("/api/v8/broken/", get(bad_gateway))
        .route("/api/v8/html/", get(html))
        .with_state(device);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v8/")
}

fn transport() -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(&TransportOptions::default()).unwrap())
}

fn identity() -> Arc<ApplicationIdentity> {
    let overrides = IdentityOverrides {
        app_name: None,
        device_name: Some("integration".to_string()),
    };
    Arc::new(ApplicationIdentity::resolve(&overrides).unwrap())
}

async fn connect(base_url: &str) -> freebox_exporter::Result<Session> {
    Session::new(
        transport(),
        identity(),
        SecretString::from(APP_TOKEN.to_string()),
        base_url,
        &RetryConfig::default(),
    )
    .await
}

#[tokio::test]
async fn session_logs_in_with_challenge_response() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device.clone()).await;

    let session = connect(&base_url).await.unwrap();

    assert_eq!(device.challenges.load(Ordering::SeqCst), 1);
    assert_eq!(device.sessions.load(Ordering::SeqCst), 1);
    assert_eq!(session.current().unwrap().session_token, "session-1");
}

#[tokio::test]
async fn wrong_app_token_fails_first_login() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device.clone()).await;

    let result = Session::new(
        transport(),
        identity(),
        SecretString::from("not-the-token".to_string()),
        &base_url,
        &RetryConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(AppError::InvalidToken(_))));
    assert_eq!(device.sessions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn requests_carry_session_header() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device.clone()).await;
    let session = connect(&base_url).await.unwrap();

    let value: Value = session.get(&format!("{base_url}connection/")).await.unwrap();

    assert_eq!(value["state"], "up");
    assert_eq!(value["bytes_down"], 1_234_567);
    assert_eq!(*device.seen_tokens.lock().unwrap(), vec!["session-1"]);
}

#[tokio::test]
async fn transport_reports_auth_required_without_header() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device).await;

    let result = transport().get(&format!("{base_url}connection/"), &[]).await;
    assert!(matches!(result, Err(AppError::AuthRequired(_))));
}

#[tokio::test]
async fn transport_maps_envelope_and_status_errors() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device).await;
    let transport = transport();

    let denied = transport.get(&format!("{base_url}denied/"), &[]).await;
    assert!(matches!(denied, Err(AppError::Api { ref code, .. }) if code == "insufficient_rights"));

    let broken = transport.get(&format!("{base_url}broken/"), &[]).await;
    assert!(matches!(broken, Err(AppError::Status(502))));

    let html = transport.get(&format!("{base_url}html/"), &[]).await;
    assert!(matches!(html, Err(AppError::Decode(_))));
}

#[tokio::test]
async fn non_auth_errors_do_not_log_in_again() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device.clone()).await;
    let session = connect(&base_url).await.unwrap();

    let result = session.get::<Value>(&format!("{base_url}denied/")).await;

    assert!(matches!(result, Err(AppError::Api { .. })));
    assert_eq!(device.sessions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_device_is_a_network_error() {
    // Bind then drop to get a closed local port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = connect(&format!("http://{addr}/api/v8/")).await;
    assert!(matches!(result, Err(AppError::Http(_))));
}

#[tokio::test]
async fn expired_session_is_refreshed_once_for_concurrent_callers() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device.clone()).await;
    let session = Arc::new(connect(&base_url).await.unwrap());

    // Let the debounce window of the first login pass
    tokio::time::sleep(REFRESH_DEBOUNCE + Duration::from_millis(200)).await;
    device.expire_session();

    let url = format!("{base_url}connection/");
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            let url = url.clone();
            tokio::spawn(async move { session.get::<Value>(&url).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap()["state"], "up");
    }

    assert_eq!(device.sessions.load(Ordering::SeqCst), 2);
    assert_eq!(session.current().unwrap().session_token, "session-2");
    assert_eq!(session.previous().unwrap().session_token, "session-1");
}

#[tokio::test]
async fn collection_cycle_polls_every_endpoint() {
    let device = Arc::new(Device::default());
    let base_url = spawn_device(device).await;
    let session = Arc::new(connect(&base_url).await.unwrap());

    let config = Config {
        base_url: base_url.clone(),
        poll_endpoints: vec![
            "connection/".to_string(),
            "system/".to_string(),
            "denied/".to_string(),
        ],
        ..Config::default()
    };
    let metrics = MetricsRegistry::new();

    let succeeded = collect_once(&config, &metrics, &session).await;
    assert_eq!(succeeded, 2);

    let encoded = metrics.encode_metrics().await.unwrap();
    assert!(encoded.contains("freebox_scrape_success_total{endpoint=\"connection/\"} 1"));
    assert!(encoded.contains("freebox_scrape_errors_total{endpoint=\"denied/\"} 1"));
    assert!(encoded.contains("freebox_session_logins 1"));
}
