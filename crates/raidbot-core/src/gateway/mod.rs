//! HTTP gateway.
//!
//! An axum [`Router`] exposing the chat endpoint, the data endpoints and the
//! embeddable widget. Handlers live in [`routes`]; the chat route sits behind
//! the per-client [`RateLimiter`].

pub mod embed;
pub mod rate_limit;
pub mod routes;

use anyhow::Context;
use axum::http::{header, Method};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use rate_limit::RateLimiter;

use crate::chat::{Classifier, FallbackOptions};
use crate::config::Config;
use crate::data::SharedData;
use crate::provider::LlmProvider;
use crate::session::ConversationStore;

/// Application state shared across handlers.
pub struct AppState {
    pub classifier: Classifier,
    pub data: SharedData,
    pub conversations: Arc<RwLock<ConversationStore>>,
    /// Backs the fallback. `None` runs rules only.
    pub provider: Option<Arc<dyn LlmProvider>>,
    pub fallback_options: FallbackOptions,
    pub limiter: RateLimiter,
    /// Required by `/api/update-data` when set.
    pub update_key: Option<String>,
    /// API base baked into `/embed.js`.
    pub public_url: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: &Config,
        data: SharedData,
        conversations: Arc<RwLock<ConversationStore>>,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            classifier: Classifier::new(config.chat.strategy),
            data,
            conversations,
            provider,
            fallback_options: config.fallback_options(),
            limiter: RateLimiter::new(config.server.rate_limit_per_minute),
            update_key: config
                .data
                .update_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
            public_url: config.server.public_url(),
            start_time: Instant::now(),
        }
    }
}

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::chat_routes(state.limiter.clone()))
        .merge(routes::data_routes())
        .merge(routes::embed_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until `cancel` fires.
pub async fn serve(state: Arc<AppState>, addr: &str, cancel: CancellationToken) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "HTTP gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { cancel.cancelled().await })
    .await
    .context("HTTP server error")?;

    info!("HTTP gateway stopped");
    Ok(())
}
