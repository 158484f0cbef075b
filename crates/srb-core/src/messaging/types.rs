use crate::domain::ReviewId;

/// Inline keyboard as rows of buttons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// The two moderation buttons attached to a review notification,
    /// side by side on one row.
    pub fn decision(id: ReviewId) -> Self {
        Self::new(vec![vec![
            InlineButton::new("✅ Approve", format!("review_approve_{}", id.0)),
            InlineButton::new("❌ Reject", format!("review_reject_{}", id.0)),
        ]])
    }
}
