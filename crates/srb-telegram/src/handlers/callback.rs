use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use srb_core::{
    callback::CallbackAction,
    domain::{ChatId, MessageId, MessageRef, ModerationAction, ReviewId},
    render,
};

use crate::router::AppState;

use super::commands;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let cb_id = q.id.clone();

    // Presses on messages Telegram no longer tracks just get acknowledged.
    let Some(message) = q.message.as_ref() else {
        let _ = state.messenger.answer_callback_query(&cb_id, None, false).await;
        return Ok(());
    };
    let chat_id = ChatId(message.chat.id.0);
    let msg_ref = MessageRef {
        chat_id,
        message_id: MessageId(message.id.0),
    };
    let data = q.data.clone().unwrap_or_default();

    match CallbackAction::parse(&data) {
        CallbackAction::StartMenu => {
            let _ = state.messenger.answer_callback_query(&cb_id, None, false).await;
            let _ = state.messenger.delete_message(msg_ref).await;
            commands::send_start_menu(&state, chat_id).await;
        }
        CallbackAction::HelpMenu => {
            let _ = state.messenger.answer_callback_query(&cb_id, None, false).await;
            commands::send_help(&state, chat_id).await;
        }
        CallbackAction::SiteStatsRequest => {
            let _ = state.messenger.answer_callback_query(&cb_id, None, false).await;
            commands::run_site_stats(&state, chat_id).await;
        }
        CallbackAction::MetricsMenu => {
            let _ = state.messenger.answer_callback_query(&cb_id, None, false).await;
            commands::send_metrics_menu(&state, chat_id).await;
        }
        CallbackAction::StatsRequest(period) => {
            let _ = state.messenger.answer_callback_query(&cb_id, None, false).await;
            commands::run_stats(&state, chat_id, &period).await;
        }
        CallbackAction::Moderation { action, id } => {
            handle_moderation(&state, &cb_id, msg_ref, action, id).await;
        }
        CallbackAction::Unknown => {
            let _ = state.messenger.answer_callback_query(&cb_id, None, false).await;
        }
    }

    Ok(())
}

/// Apply a decision and update the notification message.
///
/// On failure the original message stays untouched and the press is answered
/// alert-style; pressing again is the only retry.
async fn handle_moderation(
    state: &AppState,
    cb_id: &str,
    msg_ref: MessageRef,
    action: ModerationAction,
    id: ReviewId,
) {
    info!("processing {} for review #{}", action.as_str(), id.0);

    if !state.backend.apply(id, action).await {
        let _ = state
            .messenger
            .answer_callback_query(cb_id, Some("❌ Could not process the review"), true)
            .await;
        return;
    }

    // Rebuild the message from the cached card body; the backend is the
    // fallback (e.g. after a restart dropped the cache).
    let body = match state.cards.get(id) {
        Some(body) => body,
        None => state.backend.review_body(id).await.unwrap_or_default(),
    };

    let _ = state
        .messenger
        .edit_html(msg_ref, &render::decided_message(action, id, &body))
        .await;

    let toast = match action {
        ModerationAction::Approve => "✅ Review published on the site!",
        ModerationAction::Reject => "❌ Review rejected",
    };
    let _ = state
        .messenger
        .answer_callback_query(cb_id, Some(toast), false)
        .await;

    if action == ModerationAction::Approve {
        if let Some(channel) = state.cfg.broadcast_channel {
            if let Err(e) = state
                .messenger
                .send_html(channel, &render::broadcast_message(id, &body))
                .await
            {
                warn!("failed to publish review #{} to the channel: {e}", id.0);
            } else {
                info!("review #{} published to the channel", id.0);
            }
        }
    }

    state.cards.forget(id);
}
