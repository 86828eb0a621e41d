//! API routes for the gateway.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::embed::render_widget;
use super::rate_limit::{rate_limit_middleware, RateLimiter};
use super::AppState;
use crate::chat::{Event, Fallback, LlmFallback};
use crate::data::{Champion, ChampionQuery, ContextProvider};
use crate::error::ServiceError;

type AppStateArc = Arc<AppState>;

// ── Health Routes ───────────────────────────────────────────────────

pub fn health_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/health", get(health))
        .route("/api", get(index))
}

async fn health(State(state): State<AppStateArc>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "uptimeSecs": state.start_time.elapsed().as_secs(),
    }))
}

async fn index() -> Json<Value> {
    Json(json!({
        "status": "RAID chat assistant is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "POST /api/chat",
            "champions": "GET /api/champions",
            "events": "GET /api/events",
            "data": "GET /api/data",
            "updateData": "POST /api/update-data",
            "embed": "GET /embed.js",
            "health": "GET /health",
        },
        "timestamp": Utc::now(),
    }))
}

// ── Chat Routes ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
}

pub fn chat_routes(limiter: RateLimiter) -> Router<AppStateArc> {
    Router::new()
        .route("/api/chat", post(chat))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

async fn chat(
    State(state): State<AppStateArc>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServiceError> {
    let Json(req) = body?;
    let message = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or(ServiceError::EmptyMessage)?;
    let conversation_id = req
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let snapshot = state.data.snapshot().await;
    let fallback = match &state.provider {
        Some(provider) => Some(LlmFallback::new(
            Arc::clone(provider),
            state.fallback_options.clone(),
            &snapshot,
            &state.data.relevant_champions(message).await,
        )),
        None => None,
    };

    let now = Utc::now();
    let reply = state
        .classifier
        .respond(
            message,
            &snapshot,
            fallback.as_ref().map(|f| f as &dyn Fallback),
            now,
        )
        .await;

    state
        .conversations
        .write()
        .await
        .append(&conversation_id, message, &reply.text, now);

    info!(
        conversation = %conversation_id,
        source = reply.source.as_str(),
        "Chat reply sent"
    );

    Ok(Json(ChatResponse {
        response: reply.text,
        conversation_id,
        timestamp: now,
    }))
}

// ── Data Routes ─────────────────────────────────────────────────────

pub fn data_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/champions", get(champions))
        .route("/api/events", get(events))
        .route("/api/data", get(data))
        .route("/api/update-data", post(update_data))
}

async fn champions(
    State(state): State<AppStateArc>,
    Query(query): Query<ChampionQuery>,
) -> Json<Vec<Champion>> {
    Json(state.data.champions(&query).await)
}

async fn events(State(state): State<AppStateArc>) -> Json<Vec<Event>> {
    Json(state.data.current_events(Utc::now()).await)
}

async fn data(State(state): State<AppStateArc>) -> Json<Value> {
    let now = Utc::now();
    state.data.refresh_if_stale(now).await;

    let snapshot = state.data.snapshot().await;
    let champions = state.data.champions(&ChampionQuery::default()).await;
    let status = state.data.status(now).await;

    Json(json!({
        "success": true,
        "data": {
            "champions": champions,
            "events": snapshot.events,
            "tierList": snapshot.meta_champions,
        },
        "lastUpdate": status.last_refreshed,
        "cacheStatus": status,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KeyQuery {
    key: Option<String>,
}

async fn update_data(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Value>, ServiceError> {
    if let Some(expected) = state.update_key.as_deref() {
        let provided = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or(query.key);
        if provided.as_deref() != Some(expected) {
            warn!("Rejected data update with a missing or wrong key");
            return Err(ServiceError::Unauthorized);
        }
    }

    let now = Utc::now();
    state.data.refresh(now).await?;
    info!("Manual data update completed");

    Ok(Json(json!({
        "success": true,
        "message": "RAID data updated successfully",
        "timestamp": now,
        "cacheStatus": state.data.status(now).await,
    })))
}

// ── Embed Routes ────────────────────────────────────────────────────

pub fn embed_routes() -> Router<AppStateArc> {
    Router::new().route("/embed.js", get(embed_js))
}

async fn embed_js(State(state): State<AppStateArc>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        render_widget(&state.public_url),
    )
}
