use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::error;

use ballot_bot::Orchestrator;
use ballot_types::events::{InboundEvent, Outbound};

pub type AppState = Arc<Orchestrator>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(handle_event))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Webhook for the messaging transport: one event in, the replies to deliver out.
pub async fn handle_event(
    State(bot): State<AppState>,
    Json(event): Json<InboundEvent>,
) -> Result<Json<Vec<Outbound>>, StatusCode> {
    // SQLite calls block; keep them off the async workers.
    let replies = tokio::task::spawn_blocking(move || bot.handle(event))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(replies))
}

pub async fn health() -> &'static str {
    "ok"
}
