//! HTTP routes driven through the axum router without a socket.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use raidbot_core::config::Config;
use raidbot_core::data::SharedData;
use raidbot_core::gateway::{router, AppState};
use raidbot_core::session::ConversationStore;

struct Harness {
    app: Router,
    conversations: Arc<RwLock<ConversationStore>>,
}

async fn harness(config: Config) -> Harness {
    let data = SharedData::curated(config.cache_ttl());
    data.refresh(Utc::now()).await.unwrap();

    let conversations = Arc::new(RwLock::new(ConversationStore::new(
        config.conversation_limits(),
    )));
    let state = AppState::new(&config, data, conversations.clone(), None);

    Harness {
        app: router(Arc::new(state)),
        conversations,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_chat(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness(Config::default()).await;
    let (status, body) = send(&h.app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let h = harness(Config::default()).await;
    let (status, body) = send(&h.app, get("/api")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["chat"], "POST /api/chat");
}

#[tokio::test]
async fn test_chat_answers_and_records_history() {
    let h = harness(Config::default()).await;
    let (status, body) = send(&h.app, post_chat(r#"{"message": "any events?"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let response = body["response"].as_str().unwrap();
    assert!(response.contains("Champion Training"));
    assert!(response.contains("7 days"));

    let id = body["conversationId"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 36);
    assert_eq!(h.conversations.read().await.history(&id).len(), 2);
}

#[tokio::test]
async fn test_chat_keeps_given_conversation_id() {
    let h = harness(Config::default()).await;
    let request = post_chat(r#"{"message": "hello", "conversationId": "abc-123"}"#);
    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversationId"], "abc-123");
    assert!(body["response"].as_str().unwrap().starts_with("Hello!"));
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let h = harness(Config::default()).await;

    let (status, body) = send(&h.app, post_chat(r#"{"message": "   "}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required");

    let (status, _) = send(&h.app, post_chat("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.conversations.read().await.is_empty());
}

#[tokio::test]
async fn test_chat_malformed_bodies_answer_json_400() {
    let h = harness(Config::default()).await;

    let (status, body) = send(&h.app, post_chat(r#"{"message": 42}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&h.app, post_chat("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let plain_text = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "text/plain")
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::from(r#"{"message": "hi"}"#))
        .unwrap();
    let (status, body) = send(&h.app, plain_text).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert!(h.conversations.read().await.is_empty());
}

#[tokio::test]
async fn test_chat_rate_limited_per_client() {
    let mut config = Config::default();
    config.server.rate_limit_per_minute = 2;
    let h = harness(config).await;

    for _ in 0..2 {
        let (status, _) = send(&h.app, post_chat(r#"{"message": "hi"}"#)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&h.app, post_chat(r#"{"message": "hi"}"#)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());

    let other_client = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(r#"{"message": "hi"}"#))
        .unwrap();
    let (status, _) = send(&h.app, other_client).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_champion_filters() {
    let h = harness(Config::default()).await;

    let (status, body) = send(&h.app, get("/api/champions?faction=dark%20elves")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Kael"));
    assert!(body.as_array().unwrap().iter().all(|c| c["faction"] == "Dark Elves"));

    let (_, body) = send(&h.app, get("/api/champions?search=apo")).await;
    assert_eq!(body[0]["name"], "Apothecary");

    let (_, body) = send(&h.app, get("/api/champions?role=hp")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_events_and_data() {
    let h = harness(Config::default()).await;

    let (status, events) = send(&h.app, get("/api/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 2);
    assert_eq!(events[0]["type"], "Training Event");

    let (status, body) = send(&h.app, get("/api/data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["tierList"]["arena"].is_array());
    assert_eq!(body["cacheStatus"]["fresh"], true);
    assert!(body["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_update_data_checks_key() {
    let mut config = Config::default();
    config.data.update_key = Some("s3cret".into());
    let h = harness(config).await;

    let update = |uri: &str, key: Option<&str>| {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::empty()).unwrap()
    };

    let (status, _) = send(&h.app, update("/api/update-data", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&h.app, update("/api/update-data", Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&h.app, update("/api/update-data", Some("s3cret"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&h.app, update("/api/update-data?key=s3cret", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_data_open_without_key() {
    let h = harness(Config::default()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/update-data")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_embed_script() {
    let mut config = Config::default();
    config.server.public_url = Some("https://raid.example.com".into());
    let h = harness(config).await;

    let response = h.app.clone().oneshot(get("/embed.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/javascript"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let script = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(script.contains("'https://raid.example.com'"));
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let h = harness(Config::default()).await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header("origin", "https://fan-site.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
