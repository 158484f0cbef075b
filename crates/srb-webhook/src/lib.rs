//! Inbound review-event listener.
//!
//! A small axum app with a single POST endpoint. The website pushes newly
//! submitted reviews here; they are relayed to the moderation chat with the
//! decision buttons attached. The HTTP response to the site and the chat
//! send are decoupled failure domains: a failed send is logged, the caller
//! still gets its 200.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use srb_core::config::Config;
use srb_core::domain::ReviewId;
use srb_core::messaging::{port::MessagingPort, types::InlineKeyboard};
use srb_core::render::{ReviewCard, ReviewCards};

#[derive(Clone)]
pub struct WebhookState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub cards: Arc<ReviewCards>,
}

/// Payload pushed by the website when a visitor submits a review.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    pub review_id: i64,
    pub name: String,
    pub text: String,
    pub locale: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

pub fn app(state: WebhookState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/webhook/review", post(handle_review).fallback(fallback))
        .fallback(fallback)
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: WebhookState, port: u16) -> srb_core::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("webhook listening on {addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Everything that is not `POST /webhook/review`: preflights get their 200,
/// the rest is not found.
async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

pub async fn handle_review(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<serde_json::Value>) {
    let presented = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented != state.cfg.site_api_key {
        warn!("unauthorized webhook request");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        );
    }

    let event: ReviewEvent = match serde_json::from_str(&body) {
        Ok(ev) => ev,
        Err(e) => {
            warn!("invalid webhook payload: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request body" })),
            );
        }
    };

    info!("received review event #{}", event.review_id);
    send_notification(&state, &event).await;

    (
        StatusCode::OK,
        Json(json!({ "success": true, "reviewId": event.review_id })),
    )
}

async fn send_notification(state: &WebhookState, event: &ReviewEvent) {
    let id = ReviewId(event.review_id);
    let card = ReviewCard::new(
        id,
        &event.name,
        &event.text,
        &event.locale,
        event.avatar.is_some(),
        event.photo.is_some(),
    );
    state.cards.remember(id, card.body());

    let sent = state
        .messenger
        .send_inline_keyboard(
            state.cfg.moderation_chat,
            &card.notification(),
            InlineKeyboard::decision(id),
        )
        .await;
    match sent {
        Ok(_) => info!("review notification sent for #{}", id.0),
        Err(e) => error!("failed to send review notification for #{}: {e}", id.0),
    }
}
