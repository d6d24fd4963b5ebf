//! # Webhook Dispatcher
//!
//! HTTP endpoints Telegram posts updates to, one per bot, plus a liveness
//! route. Every request is handled to completion; failures become error
//! responses and never take the server down.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use teloxide::types::Update;
use tracing::{debug, error};

use crate::bot::{Conversation, ConversationEngine, Incoming};

pub const LOOKUP_BOT_PATH: &str = "/cinemabot";
pub const ADMIN_BOT_PATH: &str = "/adminbot";
pub const LIVENESS_TEXT: &str = "Bots are running!";

/// Receiver of decoded Telegram updates for one bot
#[async_trait]
pub trait UpdateSink: Send + Sync {
    async fn process_update(&self, update: Update) -> Result<()>;
}

#[async_trait]
impl<C: Conversation> UpdateSink for ConversationEngine<C> {
    async fn process_update(&self, update: Update) -> Result<()> {
        match Incoming::from_update(&update) {
            Some(incoming) => self.process(incoming).await,
            None => {
                debug!(bot = self.name(), update_id = update.id.0, "Ignoring non-message update");
                Ok(())
            }
        }
    }
}

#[derive(Clone)]
pub struct WebhookState {
    pub lookup: Arc<dyn UpdateSink>,
    pub admin: Arc<dyn UpdateSink>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
        }
    }
}

pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route(LOOKUP_BOT_PATH, post(lookup_webhook))
        .route(ADMIN_BOT_PATH, post(admin_webhook))
        .with_state(state)
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

async fn lookup_webhook(
    State(state): State<WebhookState>,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    dispatch("cinemabot", state.lookup.as_ref(), &body).await
}

async fn admin_webhook(
    State(state): State<WebhookState>,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    dispatch("adminbot", state.admin.as_ref(), &body).await
}

/// True for an empty body and for JSON values that carry nothing (`null`, `{}`)
fn is_empty_payload(body: &[u8]) -> bool {
    if body.iter().all(u8::is_ascii_whitespace) {
        return true;
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Null) => true,
        Ok(serde_json::Value::Object(map)) => map.is_empty(),
        _ => false,
    }
}

async fn dispatch(
    bot: &'static str,
    sink: &dyn UpdateSink,
    body: &[u8],
) -> (StatusCode, Json<WebhookResponse>) {
    if is_empty_payload(body) {
        return (StatusCode::BAD_REQUEST, Json(WebhookResponse::error("Empty request")));
    }

    let update = match serde_json::from_slice::<Update>(body) {
        Ok(update) => update,
        Err(e) => {
            error!(bot, error = %e, "Failed to decode webhook payload");
            return (StatusCode::BAD_REQUEST, Json(WebhookResponse::error(e.to_string())));
        }
    };

    match sink.process_update(update).await {
        Ok(()) => (StatusCode::OK, Json(WebhookResponse::ok())),
        Err(e) => {
            error!(bot, error = %e, "Error processing update");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(WebhookResponse::error(e.to_string())))
        }
    }
}
