//! Embedded review record store (SQLite).
//!
//! rusqlite is synchronous, so every operation runs on the blocking pool with
//! the connection behind a mutex. Storage failures are logged here and
//! degrade to `None`/`false`/empty results; a broken reporting query must
//! never take the bot down.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::error;

use crate::domain::{
    ModerationAction, NewReview, Review, ReviewCounts, ReviewId, ReviewStatus,
};
use crate::ports::ModerationBackend;
use crate::render::ReviewCard;
use crate::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    text TEXT NOT NULL,
    locale TEXT NOT NULL DEFAULT 'ru',
    avatar TEXT,
    photo TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reviews_status ON reviews(status);
"#;

const REVIEW_COLUMNS: &str =
    "id, name, text, locale, avatar, photo, status, created_at, updated_at";

#[derive(Clone)]
pub struct ReviewStore {
    conn: Arc<Mutex<Connection>>,
}

impl ReviewStore {
    /// Open (or create) the store at `path`, creating parent directories and
    /// the schema as needed. `":memory:"` opens a transient in-memory store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = if path.to_string_lossy() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(path)?
        };
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a new pending review and return the stored record.
    pub async fn create(&self, review: NewReview) -> Option<Review> {
        let now = now_utc();
        let id = self
            .call("create", move |conn| {
                conn.execute(
                    "INSERT INTO reviews (name, text, locale, avatar, photo, status, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?6)",
                    params![review.name, review.text, review.locale, review.avatar, review.photo, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        self.get(ReviewId(id)).await
    }

    pub async fn get(&self, id: ReviewId) -> Option<Review> {
        self.call("get", move |conn| {
            conn.query_row(
                &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
                params![id.0],
                row_to_review,
            )
            .optional()
        })
        .await
        .flatten()
    }

    pub async fn approve(&self, id: ReviewId) -> bool {
        self.transition(id, ReviewStatus::Approved).await
    }

    pub async fn reject(&self, id: ReviewId) -> bool {
        self.transition(id, ReviewStatus::Rejected).await
    }

    /// Atomic conditional transition: only a pending review can be decided,
    /// and the affected-row count is the success signal. Two presses racing
    /// on the same review cannot both succeed.
    async fn transition(&self, id: ReviewId, to: ReviewStatus) -> bool {
        let now = now_utc();
        self.call("transition", move |conn| {
            conn.execute(
                "UPDATE reviews SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'pending'",
                params![to.as_str(), now, id.0],
            )
        })
        .await
        .map(|changed| changed > 0)
        .unwrap_or(false)
    }

    /// Aggregate counts. All zeros on storage failure.
    pub async fn stats(&self) -> ReviewCounts {
        self.call("stats", |conn| {
            conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(status = 'pending'), 0),
                        COALESCE(SUM(status = 'approved'), 0),
                        COALESCE(SUM(status = 'rejected'), 0)
                 FROM reviews",
                [],
                |row| {
                    Ok(ReviewCounts {
                        total: row.get(0)?,
                        pending: row.get(1)?,
                        approved: row.get(2)?,
                        rejected: row.get(3)?,
                    })
                },
            )
        })
        .await
        .unwrap_or_default()
    }

    /// Reviews with the given status, newest first.
    pub async fn list_by_status(&self, status: ReviewStatus) -> Vec<Review> {
        self.call("list_by_status", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews WHERE status = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![status.as_str()], row_to_review)?;
            rows.collect()
        })
        .await
        .unwrap_or_default()
    }

    async fn call<T, F>(&self, op: &'static str, f: F) -> Option<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let joined = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("review store mutex poisoned");
            f(&conn)
        })
        .await;
        match joined {
            Ok(Ok(v)) => Some(v),
            Ok(Err(e)) => {
                error!("review store {op} failed: {e}");
                None
            }
            Err(e) => {
                error!("review store {op} task failed: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl ModerationBackend for ReviewStore {
    async fn apply(&self, id: ReviewId, action: ModerationAction) -> bool {
        match action {
            ModerationAction::Approve => self.approve(id).await,
            ModerationAction::Reject => self.reject(id).await,
        }
    }

    async fn review_body(&self, id: ReviewId) -> Option<String> {
        self.get(id).await.map(|r| ReviewCard::from_review(&r).body())
    }
}

fn now_utc() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn row_to_review(row: &Row<'_>) -> rusqlite::Result<Review> {
    let status: String = row.get(6)?;
    Ok(Review {
        id: ReviewId(row.get(0)?),
        name: row.get(1)?,
        text: row.get(2)?,
        locale: row.get(3)?,
        avatar: row.get(4)?,
        photo: row.get(5)?,
        status: ReviewStatus::parse(&status).unwrap_or(ReviewStatus::Pending),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review(name: &str) -> NewReview {
        NewReview {
            name: name.to_string(),
            text: "some text".to_string(),
            locale: "en".to_string(),
            avatar: None,
            photo: None,
        }
    }

    fn memory_store() -> ReviewStore {
        ReviewStore::open(":memory:").unwrap()
    }

    #[tokio::test]
    async fn create_starts_pending_with_equal_timestamps() {
        let store = memory_store();
        let review = store.create(new_review("A")).await.unwrap();

        assert_eq!(review.status, ReviewStatus::Pending);
        assert_eq!(review.created_at, review.updated_at);

        let fetched = store.get(review.id).await.unwrap();
        assert_eq!(fetched, review);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = memory_store();
        assert!(store.get(ReviewId(7)).await.is_none());
    }

    #[tokio::test]
    async fn approve_transitions_and_bumps_updated_at() {
        let store = memory_store();
        let review = store.create(new_review("A")).await.unwrap();

        assert!(store.approve(review.id).await);
        let after = store.get(review.id).await.unwrap();
        assert_eq!(after.status, ReviewStatus::Approved);
        assert!(after.updated_at >= after.created_at);
    }

    #[tokio::test]
    async fn decisions_are_conditional_on_pending() {
        let store = memory_store();
        let review = store.create(new_review("A")).await.unwrap();

        // The transition carries a status guard, so a second press on an
        // already-decided review reports failure instead of silently
        // succeeding (and cannot double-broadcast).
        assert!(store.approve(review.id).await);
        assert!(!store.approve(review.id).await);
        assert!(!store.reject(review.id).await);
        assert_eq!(store.get(review.id).await.unwrap().status, ReviewStatus::Approved);
    }

    #[tokio::test]
    async fn decision_on_missing_review_fails() {
        let store = memory_store();
        assert!(!store.approve(ReviewId(7)).await);
        assert!(!store.reject(ReviewId(7)).await);
    }

    #[tokio::test]
    async fn stats_counts_sum_to_total() {
        let store = memory_store();
        let a = store.create(new_review("A")).await.unwrap();
        let b = store.create(new_review("B")).await.unwrap();
        store.create(new_review("C")).await.unwrap();

        assert!(store.approve(a.id).await);
        assert!(store.reject(b.id).await);

        let counts = store.stats().await;
        assert_eq!(counts.total, 3);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.rejected, 1);
        assert_eq!(counts.total, counts.pending + counts.approved + counts.rejected);
    }

    #[tokio::test]
    async fn stats_on_empty_store_is_all_zero() {
        let store = memory_store();
        assert_eq!(store.stats().await, ReviewCounts::default());
    }

    #[tokio::test]
    async fn list_by_status_is_newest_first() {
        let store = memory_store();
        let a = store.create(new_review("A")).await.unwrap();
        let b = store.create(new_review("B")).await.unwrap();

        let pending = store.list_by_status(ReviewStatus::Pending).await;
        assert_eq!(
            pending.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![b.id, a.id]
        );
        assert!(store.list_by_status(ReviewStatus::Approved).await.is_empty());
    }

    #[tokio::test]
    async fn backend_port_applies_decisions() {
        let store = memory_store();
        let review = store.create(new_review("A")).await.unwrap();

        let backend: &dyn ModerationBackend = &store;
        assert!(backend.apply(review.id, ModerationAction::Approve).await);
        let body = backend.review_body(review.id).await.unwrap();
        assert!(body.contains("some text"));
    }
}
