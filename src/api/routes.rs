//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::error::ApiError;
use super::types::{ChatRequest, ChatResponse};
use crate::agent::Agent;

/// Shared state handed to every handler.
pub struct AppState {
    pub agent: Arc<Agent>,
}

impl AppState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> &'static str {
    "Home route"
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::InvalidInput("Query cannot be empty".to_string()));
    }

    let span = info_span!("chat", request_id = %Uuid::new_v4(), agent = state.agent.name());
    async move {
        info!("Running agent on query: {}", query);
        match state.agent.run(query).await {
            Ok(result) => Ok(Json(ChatResponse::from_agent(result))),
            Err(e) => {
                warn!("Agent failed: {}", e);
                Err(ApiError::AgentFailure(e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}
