//! Webhook event server.
//!
//! The platform glue (the Discord-facing process, or anything else) posts
//! normalized message and reaction events here and renders the returned
//! outcome. This keeps the core free of platform types while still being a
//! runnable service.
//!
//! Routes:
//! - `POST /v1/messages`  — run a message through the pipeline, outcome as JSON
//! - `POST /v1/reactions` — route a reaction verdict to the feedback tally
//! - `GET  /healthz`      — liveness probe

use crate::pipeline::{AutoResponder, InboundMessage, MatchOutcome, ReactionEvent};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Request handling deadline.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Event payloads are small; anything bigger is not a chat message.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    responder: Arc<AutoResponder>,
}

#[derive(Debug, Serialize)]
struct ReactionAck {
    recorded: bool,
}

pub fn router(responder: Arc<AutoResponder>) -> Router {
    Router::new()
        .route("/v1/messages", post(handle_message))
        .route("/v1/reactions", post(handle_reaction))
        .route("/healthz", get(healthz))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(AppState { responder })
}

/// Serve until ctrl-c.
pub async fn serve(responder: Arc<AutoResponder>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "event server listening");

    axum::serve(listener, router(responder))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("event server failed")
}

async fn handle_message(
    State(state): State<AppState>,
    Json(msg): Json<InboundMessage>,
) -> Json<MatchOutcome> {
    Json(state.responder.handle_message(&msg, Utc::now()).await)
}

async fn handle_reaction(
    State(state): State<AppState>,
    Json(event): Json<ReactionEvent>,
) -> Json<ReactionAck> {
    let recorded = state.responder.handle_reaction(&event, Utc::now()).await;
    Json(ReactionAck { recorded })
}

async fn healthz() -> &'static str {
    "ok"
}
