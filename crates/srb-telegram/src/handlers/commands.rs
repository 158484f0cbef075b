use std::sync::Arc;

use chrono::Local;
use teloxide::prelude::*;
use tracing::{info, warn};

use srb_core::{
    domain::{ChatId, NewReview, SiteStats},
    messaging::types::{InlineButton, InlineKeyboard},
    period::Period,
    render::ReviewCard,
};

use crate::router::AppState;

const HELP_TEXT: &str = "📖 <b>How to use this bot</b>\n\n\
<b>Review moderation:</b>\n\
When a visitor leaves a review on the site, you get a notification with two buttons:\n\
✅ Approve - publish the review on the site and in the channel\n\
❌ Reject - decline the review\n\n\
<b>Traffic reports:</b>\n\
/stats [period] - report for the given period\n\n\
<b>Period formats:</b>\n\
• today, yesterday\n\
• 7d, 30d - last 7/30 days\n\
• YYYY-MM - a calendar month (2025-01)\n\
• YYYY-MM-DD - a single day (2025-01-15)\n\
• YYYY-MM-DD..YYYY-MM-DD - a date range\n\n\
<b>Examples:</b>\n\
/stats today\n\
/stats 30d\n\
/stats 2025-01\n\
/stats 2025-01-01..2025-01-31\n\n\
<b>Other commands:</b>\n\
/site_stats - review counts and CMS health\n\
/test_review - send a test review notification";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);

    let (cmd, arg) = parse_command(text);
    match cmd.as_str() {
        "start" => send_start_menu(&state, chat_id).await,
        "help" => send_help(&state, chat_id).await,
        "stats" => {
            let token = if arg.is_empty() { "today" } else { arg.as_str() };
            run_stats(&state, chat_id, token).await;
        }
        "site_stats" => run_site_stats(&state, chat_id).await,
        "test_review" => run_test_review(&state, chat_id).await,
        _ => {
            let _ = state
                .messenger
                .send_html(chat_id, "❓ Unknown command. Use /help.")
                .await;
        }
    }

    Ok(())
}

pub(crate) async fn send_start_menu(state: &AppState, chat_id: ChatId) {
    let text = "👋 <b>Hi! I am the site reviews bot</b>\n\n\
I relay new reviews for moderation and report site statistics.\n\n\
Pick an action:";

    let keyboard = InlineKeyboard::new(vec![
        vec![InlineButton::new("📊 Site statistics", "menu_site_stats")],
        vec![InlineButton::new("📈 Traffic report", "menu_metrics")],
        vec![InlineButton::new("❓ Help", "menu_help")],
    ]);

    if let Err(e) = state
        .messenger
        .send_inline_keyboard(chat_id, text, keyboard)
        .await
    {
        warn!("failed to send start menu: {e}");
    }
}

pub(crate) async fn send_help(state: &AppState, chat_id: ChatId) {
    if let Err(e) = state.messenger.send_html(chat_id, HELP_TEXT).await {
        warn!("failed to send help: {e}");
    }
}

pub(crate) async fn send_metrics_menu(state: &AppState, chat_id: ChatId) {
    let text = "📈 <b>Traffic report</b>\n\nPick a period:";

    let keyboard = InlineKeyboard::new(vec![
        vec![
            InlineButton::new("📅 Today", "stats_today"),
            InlineButton::new("📅 Yesterday", "stats_yesterday"),
        ],
        vec![
            InlineButton::new("📊 7 days", "stats_7d"),
            InlineButton::new("📊 30 days", "stats_30d"),
        ],
        vec![InlineButton::new("🔙 Back", "back_to_menu")],
    ]);

    if let Err(e) = state
        .messenger
        .send_inline_keyboard(chat_id, text, keyboard)
        .await
    {
        warn!("failed to send metrics menu: {e}");
    }
}

/// Loading message first, then edit it into the report or a fixed failure
/// line. An unconfigured analytics client short-circuits before any remote
/// call.
pub(crate) async fn run_stats(state: &AppState, chat_id: ChatId, token: &str) {
    let Ok(loading) = state
        .messenger
        .send_html(chat_id, "⏳ Fetching analytics data...")
        .await
    else {
        return;
    };

    if !state.metrics.is_configured() {
        let _ = state
            .messenger
            .edit_html(
                loading,
                "⚠️ Analytics is not configured. Set the counter id and access token.",
            )
            .await;
        return;
    }

    let period = Period::parse(token);
    match state.metrics.get_metrics(&period).await {
        Some(report) => {
            let _ = state
                .messenger
                .edit_html(loading, &srb_metrics::format_report(&report))
                .await;
            info!("stats sent for period {token:?}");
        }
        None => {
            let _ = state
                .messenger
                .edit_html(
                    loading,
                    "❌ Could not fetch analytics data. Check the settings.",
                )
                .await;
        }
    }
}

pub(crate) async fn run_site_stats(state: &AppState, chat_id: ChatId) {
    let Ok(loading) = state
        .messenger
        .send_html(chat_id, "⏳ Fetching site statistics...")
        .await
    else {
        return;
    };

    match state.site.get_site_stats().await {
        Some(stats) => {
            let _ = state
                .messenger
                .edit_html(loading, &render_site_stats(&stats))
                .await;
            info!("site stats sent");
        }
        None => {
            let _ = state
                .messenger
                .edit_html(
                    loading,
                    "❌ Could not fetch site statistics. Check that the site is reachable.",
                )
                .await;
        }
    }
}

fn render_site_stats(stats: &SiteStats) -> String {
    let cms_status = if stats.cms.status == "healthy" {
        "✅ Healthy"
    } else {
        "⚠️ Degraded"
    };

    [
        "📊 <b>Site statistics</b>".to_string(),
        String::new(),
        "<b>📝 Reviews:</b>".to_string(),
        format!("• Total: {}", stats.reviews.total),
        format!("• Published: {}", stats.reviews.published),
        format!("• Pending: {}", stats.reviews.pending),
        String::new(),
        "<b>🖥 CMS:</b>".to_string(),
        format!("• Status: {cms_status}"),
        format!("• Score: {}%", stats.cms.score),
        format!(
            "• Healthy endpoints: {}/{}",
            stats.cms.successful, stats.cms.total
        ),
        String::new(),
        format!("<i>Updated: {}</i>", Local::now().format("%Y-%m-%d %H:%M")),
    ]
    .join("\n")
}

/// Diagnostics: create a synthetic review and send the standard
/// notification so the whole moderation path can be exercised by hand.
pub(crate) async fn run_test_review(state: &AppState, chat_id: ChatId) {
    let created = state
        .store
        .create(NewReview {
            name: "Test User".to_string(),
            text: "This is a test review to check that notifications are wired up correctly!"
                .to_string(),
            locale: "en".to_string(),
            avatar: None,
            photo: None,
        })
        .await;

    let Some(review) = created else {
        let _ = state
            .messenger
            .send_html(chat_id, "❌ Could not create a test review.")
            .await;
        return;
    };

    let card = ReviewCard::from_review(&review);
    state.cards.remember(review.id, card.body());

    match state
        .messenger
        .send_inline_keyboard(
            chat_id,
            &card.notification(),
            InlineKeyboard::decision(review.id),
        )
        .await
    {
        Ok(_) => info!("test review #{} created and notification sent", review.id.0),
        Err(e) => warn!("failed to send test review notification: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srb_core::domain::{CmsHealth, RemoteReviewCounts};

    #[test]
    fn parses_commands_with_bot_suffix_and_args() {
        assert_eq!(parse_command("/stats 7d"), ("stats".to_string(), "7d".to_string()));
        assert_eq!(parse_command("/stats@srb_bot 2025-01"), ("stats".to_string(), "2025-01".to_string()));
        assert_eq!(parse_command("/START"), ("start".to_string(), String::new()));
        assert_eq!(parse_command("  /help  "), ("help".to_string(), String::new()));
    }

    #[test]
    fn site_stats_rendering() {
        let stats = SiteStats {
            reviews: RemoteReviewCounts {
                total: 12,
                published: 10,
                pending: 2,
            },
            cms: CmsHealth {
                status: "healthy".to_string(),
                score: 95,
                successful: 9,
                total: 10,
            },
        };

        let text = render_site_stats(&stats);
        assert!(text.contains("• Total: 12"));
        assert!(text.contains("• Published: 10"));
        assert!(text.contains("• Pending: 2"));
        assert!(text.contains("• Status: ✅ Healthy"));
        assert!(text.contains("• Score: 95%"));
        assert!(text.contains("• Healthy endpoints: 9/10"));

        let degraded = SiteStats {
            reviews: RemoteReviewCounts::default(),
            cms: CmsHealth::default(),
        };
        assert!(render_site_stats(&degraded).contains("• Status: ⚠️ Degraded"));
    }
}
