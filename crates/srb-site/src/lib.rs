//! Website API adapter.
//!
//! Wraps the site's review-management and health endpoints. Every call is
//! best-effort: failures are logged and surface as `false`/`None`, never as
//! an error the handlers have to deal with.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use srb_core::domain::{
    CmsHealth, ModerationAction, RemoteReviewCounts, ReviewId, SiteStats,
};
use srb_core::ports::ModerationBackend;
use srb_core::render::ReviewCard;

#[derive(Clone, Debug)]
pub struct SiteClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

/// Review record as the site API returns it.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReview {
    pub id: i64,
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CmsHealthResponse {
    #[serde(default)]
    summary: CmsSummary,
}

#[derive(Debug, Default, Deserialize)]
struct CmsSummary {
    #[serde(default)]
    overall: Option<String>,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    successful: Option<u32>,
}

impl SiteClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client build");
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        }
    }

    /// Post a moderation decision. True only on an HTTP success with
    /// `success: true` in the body.
    pub async fn publish_review(&self, id: ReviewId, action: ModerationAction) -> bool {
        info!("posting {} for review #{}", action.as_str(), id.0);

        let url = format!("{}/api/reviews/moderate", self.base_url);
        let body = serde_json::json!({ "reviewId": id.0, "action": action.as_str() });

        let resp = self
            .http
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(resp) if resp.status().is_success() => match resp.json::<ModerateResponse>().await {
                Ok(out) if out.success => true,
                Ok(out) => {
                    warn!(
                        "site declined moderation of review #{}: {}",
                        id.0,
                        out.error.unwrap_or_default()
                    );
                    false
                }
                Err(e) => {
                    warn!("moderation response decode failed for review #{}: {e}", id.0);
                    false
                }
            },
            Ok(resp) => {
                warn!("moderation of review #{} failed: HTTP {}", id.0, resp.status());
                false
            }
            Err(e) => {
                warn!("moderation request for review #{} failed: {e}", id.0);
                false
            }
        }
    }

    /// Best-effort fetch of a single review.
    pub async fn get_review(&self, id: ReviewId) -> Option<RemoteReview> {
        let url = format!("{}/api/reviews/{}", self.base_url, id.0);
        self.get_json::<RemoteReview>(&url).await
    }

    /// Site-health snapshot. The two sub-calls are independently
    /// best-effort: a failed portion degrades to defaults, and only both
    /// failing makes the whole snapshot unavailable.
    pub async fn get_site_stats(&self) -> Option<SiteStats> {
        info!("fetching site statistics");

        let reviews = self
            .get_json::<RemoteReviewCounts>(&format!("{}/api/reviews/stats", self.base_url))
            .await;
        let cms = self
            .get_json::<CmsHealthResponse>(&format!("{}/api/cms-health", self.base_url))
            .await
            .map(cms_from_response);

        compose_site_stats(reviews, cms)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Option<T> {
        match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<T>().await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("decode of {url} failed: {e}");
                    None
                }
            },
            Ok(resp) => {
                warn!("GET {url} failed: HTTP {}", resp.status());
                None
            }
            Err(e) => {
                warn!("GET {url} failed: {e}");
                None
            }
        }
    }
}

fn cms_from_response(resp: CmsHealthResponse) -> CmsHealth {
    CmsHealth {
        status: resp.summary.overall.unwrap_or_else(|| "unknown".to_string()),
        score: resp.summary.score.unwrap_or(0),
        successful: resp.summary.successful.unwrap_or(0),
        total: resp.summary.total.unwrap_or(0),
    }
}

fn compose_site_stats(
    reviews: Option<RemoteReviewCounts>,
    cms: Option<CmsHealth>,
) -> Option<SiteStats> {
    if reviews.is_none() && cms.is_none() {
        return None;
    }
    Some(SiteStats {
        reviews: reviews.unwrap_or_default(),
        cms: cms.unwrap_or_default(),
    })
}

#[async_trait]
impl ModerationBackend for SiteClient {
    async fn apply(&self, id: ReviewId, action: ModerationAction) -> bool {
        self.publish_review(id, action).await
    }

    async fn review_body(&self, id: ReviewId) -> Option<String> {
        let r = self.get_review(id).await?;
        let card = ReviewCard::new(
            ReviewId(r.id),
            &r.name,
            &r.text,
            &r.locale,
            r.avatar.is_some(),
            r.photo.is_some(),
        );
        Some(card.body())
    }
}
