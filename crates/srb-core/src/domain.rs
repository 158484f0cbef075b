use crate::period::Period;

/// Telegram chat id (numeric; channels and groups are negative).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Review id, assigned by whichever system owns the canonical record
/// (the local store or the remote site).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReviewId(pub i64);

/// Moderation lifecycle of a review. `Approved` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A stored review record. Timestamps are UTC, text-encoded as
/// `YYYY-MM-DD HH:MM:SS`; `updated_at >= created_at` always holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub name: String,
    pub text: String,
    pub locale: String,
    pub avatar: Option<String>,
    pub photo: Option<String>,
    pub status: ReviewStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating a review record.
#[derive(Clone, Debug, Default)]
pub struct NewReview {
    pub name: String,
    pub text: String,
    pub locale: String,
    pub avatar: Option<String>,
    pub photo: Option<String>,
}

/// Aggregate review counts from the local store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReviewCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// The human decision applied to a pending review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Aggregated analytics result for one period.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsReport {
    pub period: Period,
    pub visits: u64,
    pub users: u64,
    pub page_views: u64,
    /// Descending by views, at most 10 entries.
    pub top_pages: Vec<TopPage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopPage {
    pub url: String,
    pub views: u64,
}

/// Site-health snapshot composed from the site API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteStats {
    pub reviews: RemoteReviewCounts,
    pub cms: CmsHealth,
}

/// Review counts as reported by the remote site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub struct RemoteReviewCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub published: u64,
    #[serde(default)]
    pub pending: u64,
}

/// CMS health as reported by the remote site. Score is 0-100.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CmsHealth {
    pub status: String,
    pub score: u32,
    pub successful: u32,
    pub total: u32,
}

impl Default for CmsHealth {
    fn default() -> Self {
        Self {
            status: "unknown".to_string(),
            score: 0,
            successful: 0,
            total: 0,
        }
    }
}
