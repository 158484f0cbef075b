//! Fixed message texts: the review notification card, decision banners, the
//! channel broadcast, plus small HTML/number helpers shared by the adapters.

use std::{collections::HashMap, sync::Mutex};

use chrono::Local;

use crate::domain::{ModerationAction, Review, ReviewId};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Strip scheme and host from a URL, keeping the path (`"/"` when empty).
/// Non-URL strings pass through unchanged.
pub fn url_path(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(r) => match r.find('/') {
            Some(i) => r[i..].to_string(),
            None => "/".to_string(),
        },
        None if url.is_empty() => "/".to_string(),
        None => url.to_string(),
    }
}

fn locale_badge(locale: &str) -> (&'static str, String) {
    match locale {
        "ru" => ("🇷🇺", "RU".to_string()),
        "en" => ("🇬🇧", "EN".to_string()),
        "id" => ("🇮🇩", "ID".to_string()),
        other => ("🌐", other.to_uppercase()),
    }
}

fn yes_no(present: bool) -> &'static str {
    if present {
        "✅ yes"
    } else {
        "❌ no"
    }
}

/// The review details shown to moderators. Built either from an inbound
/// event (stamped with today's date) or from a stored record.
#[derive(Clone, Debug)]
pub struct ReviewCard {
    pub id: ReviewId,
    pub name: String,
    pub text: String,
    pub locale: String,
    pub has_avatar: bool,
    pub has_photo: bool,
    pub date: String,
}

impl ReviewCard {
    pub fn new(
        id: ReviewId,
        name: &str,
        text: &str,
        locale: &str,
        has_avatar: bool,
        has_photo: bool,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            text: text.to_string(),
            locale: locale.to_string(),
            has_avatar,
            has_photo,
            date: Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    pub fn from_review(review: &Review) -> Self {
        Self {
            id: review.id,
            name: review.name.clone(),
            text: review.text.clone(),
            locale: review.locale.clone(),
            has_avatar: review.avatar.is_some(),
            has_photo: review.photo.is_some(),
            // The stored timestamp is "YYYY-MM-DD HH:MM:SS"; keep the date.
            date: review
                .created_at
                .split_whitespace()
                .next()
                .unwrap_or(&review.created_at)
                .to_string(),
        }
    }

    /// The human-readable middle of the notification, without the header and
    /// the id footer. This is what decision banners and the channel
    /// broadcast are prepended to.
    pub fn body(&self) -> String {
        let (flag, tag) = locale_badge(&self.locale);
        format!(
            "<b>Date:</b> {}\n\
             <b>Language:</b> {flag} {tag}\n\
             <b>Name:</b> {}\n\
             <b>Text:</b>\n{}\n\
             <b>Avatar:</b> {}\n\
             <b>Photo:</b> {}",
            self.date,
            escape_html(&self.name),
            escape_html(&self.text),
            yes_no(self.has_avatar),
            yes_no(self.has_photo),
        )
    }

    /// The full notification message the decision buttons are attached to.
    pub fn notification(&self) -> String {
        format!(
            "<b>📝 New Review (Pending)</b>\n\
             ────────────────\n\
             {}\n\
             ────────────────\n\
             <b>Review ID:</b> {}",
            self.body(),
            self.id.0
        )
    }
}

/// Notification text after a decision: outcome banner over the card body.
pub fn decided_message(action: ModerationAction, id: ReviewId, body: &str) -> String {
    let banner = match action {
        ModerationAction::Approve => format!("✅ <b>Review #{} published</b>", id.0),
        ModerationAction::Reject => format!("❌ <b>Review #{} rejected</b>", id.0),
    };
    format!("{banner}\n\n{body}")
}

/// The differently-formatted message for the public reviews channel.
pub fn broadcast_message(id: ReviewId, body: &str) -> String {
    format!("⭐️ <b>New review</b>\n\n{body}\n\n#review{}", id.0)
}

/// Card bodies of reviews whose notification is awaiting a decision, keyed
/// by review id. Lets the decision handler rebuild the message without
/// re-parsing its own rendered text; the moderation backend is the fallback
/// when an entry is missing (e.g. after a restart).
#[derive(Default)]
pub struct ReviewCards {
    inner: Mutex<HashMap<i64, String>>,
}

impl ReviewCards {
    pub fn remember(&self, id: ReviewId, body: String) {
        self.inner
            .lock()
            .expect("review cards mutex poisoned")
            .insert(id.0, body);
    }

    pub fn get(&self, id: ReviewId) -> Option<String> {
        self.inner
            .lock()
            .expect("review cards mutex poisoned")
            .get(&id.0)
            .cloned()
    }

    pub fn forget(&self, id: ReviewId) {
        self.inner
            .lock()
            .expect("review cards mutex poisoned")
            .remove(&id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        assert_eq!(escape_html("<b>&\"x\"</b>"), "&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn strips_url_to_path() {
        assert_eq!(url_path("https://example.com/services/tours"), "/services/tours");
        assert_eq!(url_path("http://example.com"), "/");
        assert_eq!(url_path("https://example.com/"), "/");
        assert_eq!(url_path(""), "/");
        assert_eq!(url_path("/already/a/path"), "/already/a/path");
    }

    #[test]
    fn notification_carries_id_and_escaped_content() {
        let card = ReviewCard {
            id: ReviewId(7),
            name: "A <B>".to_string(),
            text: "great & cozy".to_string(),
            locale: "en".to_string(),
            has_avatar: true,
            has_photo: false,
            date: "2025-01-15".to_string(),
        };
        let text = card.notification();
        assert!(text.contains("<b>Review ID:</b> 7"));
        assert!(text.contains("A &lt;B&gt;"));
        assert!(text.contains("great &amp; cozy"));
        assert!(text.contains("🇬🇧 EN"));
        assert!(text.contains("<b>Avatar:</b> ✅ yes"));
        assert!(text.contains("<b>Photo:</b> ❌ no"));
    }

    #[test]
    fn decided_message_prepends_banner() {
        let text = decided_message(ModerationAction::Approve, ReviewId(7), "body");
        assert!(text.starts_with("✅ <b>Review #7 published</b>\n\nbody"));

        let text = decided_message(ModerationAction::Reject, ReviewId(7), "body");
        assert!(text.starts_with("❌ <b>Review #7 rejected</b>"));
    }

    #[test]
    fn review_cards_round_trip() {
        let cards = ReviewCards::default();
        assert!(cards.get(ReviewId(1)).is_none());

        cards.remember(ReviewId(1), "body".to_string());
        assert_eq!(cards.get(ReviewId(1)).as_deref(), Some("body"));

        cards.forget(ReviewId(1));
        assert!(cards.get(ReviewId(1)).is_none());
    }
}
