//! Webhook HTTP server.
//!
//! Routes:
//! - `GET /` health check
//! - `GET /test?msg=...` posts `msg` straight to the group, bypassing the responder
//! - `POST /debug` runs a payload through the responder and reports whether it replied
//! - `POST /webhook` the GroupMe callback URL
//!
//! The webhook always acknowledges; replies are posted in the background.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::platform::groupme::GroupMeClient;
use crate::platform::InboundMessage;
use crate::responder::Responder;

const DEFAULT_TEST_MESSAGE: &str = "Test OK";

// ── Shared state ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub responder: Arc<Responder>,
    pub groupme: Arc<GroupMeClient>,
}

impl AppState {
    pub fn new(responder: Arc<Responder>, groupme: Arc<GroupMeClient>) -> Self {
        Self { responder, groupme }
    }

    /// Resolve a reply and, if there is one, post it in the background.
    async fn reply_to(&self, message: &InboundMessage) -> bool {
        match self.responder.resolve_reply(message).await {
            Some(reply) => {
                self.groupme.dispatch(reply);
                true
            }
            None => false,
        }
    }
}

#[derive(Deserialize)]
struct TestParams {
    msg: Option<String>,
}

// ── Handlers ───────────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "jokebot alive"
}

async fn test_post(
    State(state): State<AppState>,
    Query(params): Query<TestParams>,
) -> &'static str {
    let msg = params
        .msg
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_TEST_MESSAGE.to_string());
    info!("Manual test post: {}", msg);
    state.groupme.dispatch(msg);
    "sent"
}

async fn debug_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    debug!("Debug payload: {}", String::from_utf8_lossy(&body));
    let message = InboundMessage::from_body(&body);
    let replied = state.reply_to(&message).await;
    Json(json!({ "ok": true, "replied": replied }))
}

async fn webhook(State(state): State<AppState>, body: Bytes) -> &'static str {
    let message = InboundMessage::from_body(&body);
    info!(
        "Incoming webhook: sender_type='{}' text='{}'",
        message.sender_type, message.text
    );
    state.reply_to(&message).await;
    "ok"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/test", get(test_post))
        .route("/debug", post(debug_webhook))
        .route("/webhook", post(webhook))
        .fallback(not_found)
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Webhook server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
