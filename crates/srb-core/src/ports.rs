use async_trait::async_trait;

use crate::domain::{ModerationAction, ReviewId};

/// Backing system a moderation decision is applied to.
///
/// Two implementations exist: the embedded review store (local variant) and
/// the remote site API (proxy variant). `Config::moderation_backend` picks
/// one at startup; handlers only see this trait.
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    /// Apply the decision. False means the review does not exist, was
    /// already decided, or the backing call failed.
    async fn apply(&self, id: ReviewId, action: ModerationAction) -> bool;

    /// Best-effort review card body for rebuilding the notification message
    /// after a decision. `None` when the record cannot be fetched.
    async fn review_body(&self, id: ReviewId) -> Option<String>;
}
