//! Inline-button callback data, decoded once at the boundary.

use crate::domain::{ModerationAction, ReviewId};

/// Decoded button press. Handlers match exhaustively on this closed set
/// instead of re-testing raw string prefixes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    StartMenu,
    HelpMenu,
    SiteStatsRequest,
    MetricsMenu,
    /// Raw period token, fed to the period parser by the handler.
    StatsRequest(String),
    Moderation {
        action: ModerationAction,
        id: ReviewId,
    },
    Unknown,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        match data {
            "back_to_menu" => Self::StartMenu,
            "menu_help" => Self::HelpMenu,
            "menu_site_stats" => Self::SiteStatsRequest,
            "menu_metrics" => Self::MetricsMenu,
            _ => {
                if let Some(period) = data.strip_prefix("stats_") {
                    if !period.is_empty() {
                        return Self::StatsRequest(period.to_string());
                    }
                    return Self::Unknown;
                }
                if let Some(rest) = data.strip_prefix("review_approve_") {
                    return moderation(ModerationAction::Approve, rest);
                }
                if let Some(rest) = data.strip_prefix("review_reject_") {
                    return moderation(ModerationAction::Reject, rest);
                }
                Self::Unknown
            }
        }
    }
}

fn moderation(action: ModerationAction, raw_id: &str) -> CallbackAction {
    match parse_id(raw_id) {
        Some(id) => CallbackAction::Moderation { action, id },
        None => CallbackAction::Unknown,
    }
}

fn parse_id(s: &str) -> Option<ReviewId> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok().map(ReviewId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_tokens() {
        assert_eq!(CallbackAction::parse("back_to_menu"), CallbackAction::StartMenu);
        assert_eq!(CallbackAction::parse("menu_help"), CallbackAction::HelpMenu);
        assert_eq!(CallbackAction::parse("menu_site_stats"), CallbackAction::SiteStatsRequest);
        assert_eq!(CallbackAction::parse("menu_metrics"), CallbackAction::MetricsMenu);
    }

    #[test]
    fn stats_tokens_carry_the_raw_period() {
        assert_eq!(
            CallbackAction::parse("stats_7d"),
            CallbackAction::StatsRequest("7d".to_string())
        );
        assert_eq!(
            CallbackAction::parse("stats_yesterday"),
            CallbackAction::StatsRequest("yesterday".to_string())
        );
        assert_eq!(CallbackAction::parse("stats_"), CallbackAction::Unknown);
    }

    #[test]
    fn moderation_tokens() {
        assert_eq!(
            CallbackAction::parse("review_approve_123"),
            CallbackAction::Moderation {
                action: ModerationAction::Approve,
                id: ReviewId(123)
            }
        );
        assert_eq!(
            CallbackAction::parse("review_reject_7"),
            CallbackAction::Moderation {
                action: ModerationAction::Reject,
                id: ReviewId(7)
            }
        );
    }

    #[test]
    fn malformed_tokens_are_unknown() {
        for raw in [
            "",
            "review_approve_",
            "review_approve_12x",
            "review_approve_-3",
            "review_publish_3",
            "menu_unknown",
            "askuser:1:2",
        ] {
            assert_eq!(CallbackAction::parse(raw), CallbackAction::Unknown, "input {raw:?}");
        }
    }
}
