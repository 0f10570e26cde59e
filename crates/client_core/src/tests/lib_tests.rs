use std::sync::Arc;

use super::*;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::{domain::ChannelId, settings::Theme};
use std::collections::HashMap;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct ServerState {
    seen: Arc<Mutex<Vec<(String, Value)>>>,
}

impl ServerState {
    async fn record(&self, route: &str, value: Value) {
        self.seen.lock().await.push((route.to_string(), value));
    }

    async fn seen(&self) -> Vec<(String, Value)> {
        self.seen.lock().await.clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn handle_login(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("login", body.clone()).await;
    if body["username"] == "otp-user" && body.get("twoFactorToken").is_none() {
        return Json(json!({"success": false, "requires2fa": true, "session_id": "pending-1"}));
    }
    if body["password"] == "secret" {
        Json(json!({"success": true, "token": "tok-1"}))
    } else {
        Json(json!({"success": false, "message": "bad credentials"}))
    }
}

async fn handle_verify(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("verify", body.clone()).await;
    Json(json!({"success": body["twoFactorToken"] == "123456", "token": "tok-2fa"}))
}

async fn handle_register(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record("register", body.clone()).await;
    if body["username"] == "taken" {
        (
            StatusCode::CONFLICT,
            Json(json!({"success": false, "message": "username taken"})),
        )
    } else {
        (StatusCode::OK, Json(json!({"success": true})))
    }
}

async fn handle_channels(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if bearer(&headers).as_deref() != Some("tok-1") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "unauthorized"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "channels": [{
                "id": 1,
                "name": "general",
                "creator": "alice",
                "createdAt": "2024-05-01T10:00:00Z",
                "unreadCount": 2
            }]
        })),
    )
}

async fn handle_messages(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state
        .record(
            "messages",
            json!({"token": bearer(&headers), "query": query}),
        )
        .await;
    Json(json!({
        "success": true,
        "messages": [{"sender": "bob", "text": "hi", "timestamp": "2024-05-01T10:00:00Z"}]
    }))
}

async fn handle_message(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .record("message", json!({"token": bearer(&headers), "body": body}))
        .await;
    Json(json!({"success": true}))
}

async fn handle_garbage() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_chat_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/login", post(handle_login))
        .route("/api/2fa/verify-login", post(handle_verify))
        .route("/api/register", post(handle_register))
        .route("/api/ping", get(|| async { "pong" }))
        .route("/api/channels", get(handle_channels))
        .route("/api/messages", get(handle_messages))
        .route("/api/message", post(handle_message))
        .route("/api/garbage", get(handle_garbage))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    // Bare host:port, the way users type it into the settings form.
    (addr.to_string(), state)
}

fn backend_in(dir: &tempfile::TempDir) -> NativeBackend {
    NativeBackend::new(SettingsStore::in_dir(dir.path()))
}

fn login_request(server: &str, username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        server: server.to_string(),
        username: username.to_string(),
        password: password.to_string(),
        ..LoginRequest::default()
    }
}

#[tokio::test]
async fn login_returns_token_on_success() {
    let (server, state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let response = backend
        .login(login_request(&server, "alice", "secret"))
        .await
        .expect("login");

    assert!(response.success);
    assert_eq!(response.token.as_deref(), Some("tok-1"));
    let seen = state.seen().await;
    assert_eq!(seen[0].0, "login");
    assert!(seen[0].1.get("twoFactorToken").is_none());
}

#[tokio::test]
async fn login_rejection_is_not_an_error() {
    let (server, _state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let response = backend
        .login(login_request(&server, "alice", "wrong"))
        .await
        .expect("login");

    assert!(!response.success);
    assert_eq!(response.message.as_deref(), Some("bad credentials"));
}

#[tokio::test]
async fn two_factor_round_trip_uses_verify_endpoint() {
    let (server, state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let first = backend
        .login(login_request(&server, "otp-user", "secret"))
        .await
        .expect("first round");
    assert!(first.requires_two_factor());
    assert_eq!(first.session_id.as_deref(), Some("pending-1"));

    let mut second = login_request(&server, "otp-user", "secret");
    second.two_factor = Some("123456".into());
    second.session_id = first.session_id.clone();
    let verified = backend.login(second).await.expect("second round");

    assert!(verified.success);
    assert_eq!(verified.token.as_deref(), Some("tok-2fa"));
    let seen = state.seen().await;
    assert_eq!(seen[1].0, "verify");
    assert_eq!(seen[1].1["sessionId"], "pending-1");
    assert!(seen[1].1.get("password").is_none());
}

#[tokio::test]
async fn register_surfaces_server_message_on_conflict() {
    let (server, _state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let ok = backend
        .register(&server, "newbie", "pw")
        .await
        .expect("register");
    assert!(ok.success);

    let taken = backend
        .register(&server, "taken", "pw")
        .await
        .expect("register");
    assert!(!taken.success);
    assert_eq!(taken.message.as_deref(), Some("username taken"));
}

#[tokio::test]
async fn check_dumb_reports_reachability() {
    let (server, _state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    assert!(backend.check_dumb(&server).await);
    assert!(backend.check_dumb(&format!("http://{server}/")).await);

    let closed = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let closed_addr = closed.local_addr().expect("addr").to_string();
    drop(closed);
    assert!(!backend.check_dumb(&closed_addr).await);
    assert!(!backend.check_dumb("").await);
}

#[tokio::test]
async fn get_channels_sends_bearer_token() {
    let (server, _state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let listed = backend.get_channels(&server, "tok-1").await.expect("channels");
    assert!(listed.success);
    assert_eq!(listed.channels.len(), 1);
    assert_eq!(listed.channels[0].id, ChannelId::new("1"));
    assert_eq!(listed.channels[0].unread_count, 2);

    let denied = backend
        .get_channels(&server, "stale")
        .await
        .expect("channels");
    assert!(!denied.success);
    assert!(denied.channels.is_empty());
}

#[tokio::test]
async fn api_get_turns_data_into_query() {
    let (server, state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let reply = backend
        .api_get(&server, "tok-1", "/api/messages", json!({"channel": 9}))
        .await
        .expect("messages");
    assert_eq!(reply["success"], true);
    assert_eq!(reply["messages"][0]["sender"], "bob");

    let seen = state.seen().await;
    assert_eq!(seen[0].1["token"], "tok-1");
    assert_eq!(seen[0].1["query"]["channel"], "9");
}

#[tokio::test]
async fn api_post_sends_json_body() {
    let (server, state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let reply = backend
        .api_post(
            &server,
            "tok-1",
            "/api/message",
            json!({"channel": "9", "text": "hello"}),
        )
        .await
        .expect("send");
    assert_eq!(reply["success"], true);

    let seen = state.seen().await;
    assert_eq!(seen[0].0, "message");
    assert_eq!(seen[0].1["body"]["text"], "hello");
}

#[tokio::test]
async fn non_json_reply_is_malformed() {
    let (server, _state) = spawn_chat_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    let err = backend
        .api_get(&server, "tok-1", "/api/garbage", Value::Null)
        .await
        .expect_err("must fail");
    assert!(matches!(err, BackendError::Malformed(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let closed = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = closed.local_addr().expect("addr").to_string();
    drop(closed);

    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);
    let err = backend
        .login(login_request(&addr, "alice", "secret"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, BackendError::Unreachable(_)));
}

#[tokio::test]
async fn settings_updates_are_visible_to_get_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = backend_in(&dir);

    assert_eq!(backend.get_settings().await.expect("defaults"), AppSettings::default());

    backend
        .update_setting(SettingUpdate::ServerUrl("chat.local:8000".into()))
        .await
        .expect("server");
    backend
        .update_setting(SettingUpdate::Theme(Theme::Dark))
        .await
        .expect("theme");

    let settings = backend.get_settings().await.expect("settings");
    assert_eq!(settings.server_url, "chat.local:8000");
    assert_eq!(settings.theme, Theme::Dark);
}
