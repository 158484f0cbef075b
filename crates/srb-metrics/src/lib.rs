//! Analytics API adapter (Yandex Metrika reporting).
//!
//! Two queries per report: aggregate totals and the top pages. Unlike the
//! site client, a failure in either collapses the whole report, since the
//! headline numbers and the page list must describe the same data.

use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use serde_json::Value;
use tracing::{info, warn};

use srb_core::domain::{MetricsReport, TopPage};
use srb_core::period::{Period, PeriodKind};
use srb_core::render::{group_thousands, url_path};

const DEFAULT_BASE_URL: &str = "https://api-metrika.yandex.net/stat/v1";

/// Top pages shown in the formatted report (the query fetches 10).
const TOP_PAGES_SHOWN: usize = 5;

#[derive(Clone, Debug)]
pub struct MetricsClient {
    counter_id: Option<String>,
    token: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl MetricsClient {
    pub fn new(counter_id: Option<String>, token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            counter_id,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    /// False when the counter id / token pair is absent; no call will ever
    /// attempt network I/O in that state.
    pub fn is_configured(&self) -> bool {
        self.counter_id.is_some() && self.token.is_some()
    }

    /// Fetch the report for a period. Absent when unconfigured or when any
    /// of the two queries fails (no partial reports).
    pub async fn get_metrics(&self, period: &Period) -> Option<MetricsReport> {
        let (Some(counter), Some(token)) = (self.counter_id.as_deref(), self.token.as_deref())
        else {
            warn!("analytics not configured; skipping metrics query");
            return None;
        };

        let date1 = period.start_str();
        let date2 = period.end_str();
        info!("fetching metrics for {date1}..{date2}");

        let totals = self
            .query(
                token,
                &[
                    ("ids", counter),
                    ("date1", &date1),
                    ("date2", &date2),
                    ("metrics", "ym:s:visits,ym:s:users,ym:s:pageviews"),
                    ("accuracy", "full"),
                ],
            )
            .await?;

        let pages = self
            .query(
                token,
                &[
                    ("ids", counter),
                    ("date1", &date1),
                    ("date2", &date2),
                    ("dimensions", "ym:s:startURL"),
                    ("metrics", "ym:s:pageviews"),
                    ("sort", "-ym:s:pageviews"),
                    ("limit", "10"),
                    ("accuracy", "full"),
                ],
            )
            .await?;

        let (visits, users, page_views) = extract_totals(&totals);
        Some(MetricsReport {
            period: *period,
            visits,
            users,
            page_views,
            top_pages: extract_top_pages(&pages),
        })
    }

    /// Report for the most recently completed Monday-Sunday week.
    pub async fn get_weekly_metrics(&self) -> Option<MetricsReport> {
        let period = last_full_week(Local::now().date_naive());
        self.get_metrics(&period).await
    }

    async fn query(&self, token: &str, params: &[(&str, &str)]) -> Option<Value> {
        let url = format!("{}/data", self.base_url);
        match self
            .http
            .get(&url)
            .query(params)
            .header("Authorization", format!("OAuth {token}"))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("analytics response decode failed: {e}");
                    None
                }
            },
            Ok(resp) => {
                warn!("analytics query failed: HTTP {}", resp.status());
                None
            }
            Err(e) => {
                warn!("analytics request failed: {e}");
                None
            }
        }
    }
}

/// Render a report for Telegram (HTML).
pub fn format_report(report: &MetricsReport) -> String {
    let range = if report.period.start == report.period.end {
        report.period.start_str()
    } else {
        format!("{} - {}", report.period.start_str(), report.period.end_str())
    };

    let mut lines = vec![
        format!("📊 <b>Report for {range}</b>"),
        String::new(),
        format!("👥 <b>Users:</b> {}", group_thousands(report.users)),
        format!("🔄 <b>Visits:</b> {}", group_thousands(report.visits)),
        format!("📄 <b>Page views:</b> {}", group_thousands(report.page_views)),
        String::new(),
        "<b>Top pages:</b>".to_string(),
    ];

    for (i, page) in report.top_pages.iter().take(TOP_PAGES_SHOWN).enumerate() {
        lines.push(format!(
            "{}. {} - {}",
            i + 1,
            url_path(&page.url),
            group_thousands(page.views)
        ));
    }

    lines.join("\n")
}

/// Most recently completed Monday-Sunday week relative to `today`: this
/// week's Monday, back 7 days, plus 6 for the Sunday.
pub fn last_full_week(today: NaiveDate) -> Period {
    let this_monday = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
    let start = this_monday - chrono::Duration::days(7);
    Period {
        kind: PeriodKind::Custom,
        start,
        end: start + chrono::Duration::days(6),
        was_fallback: false,
    }
}

fn extract_totals(v: &Value) -> (u64, u64, u64) {
    let totals = v.get("totals").and_then(Value::as_array);
    let nth = |i: usize| {
        totals
            .and_then(|a| a.get(i))
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as u64
    };
    (nth(0), nth(1), nth(2))
}

fn extract_top_pages(v: &Value) -> Vec<TopPage> {
    let Some(rows) = v.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let url = row
                .get("dimensions")?
                .get(0)?
                .get("name")?
                .as_str()?
                .to_string();
            let views = row
                .get("metrics")?
                .get(0)?
                .as_f64()
                .unwrap_or(0.0) as u64;
            Some(TopPage { url, views })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unconfigured_client_reports_so() {
        assert!(!MetricsClient::new(None, None).is_configured());
        assert!(!MetricsClient::new(Some("1".into()), None).is_configured());
        assert!(MetricsClient::new(Some("1".into()), Some("t".into())).is_configured());
    }

    #[test]
    fn totals_extraction() {
        let v = json!({ "totals": [120.0, 80.0, 300.0] });
        assert_eq!(extract_totals(&v), (120, 80, 300));

        // Missing or short totals degrade to zeros.
        assert_eq!(extract_totals(&json!({})), (0, 0, 0));
        assert_eq!(extract_totals(&json!({ "totals": [5.0] })), (5, 0, 0));
    }

    #[test]
    fn top_pages_extraction() {
        let v = json!({
            "data": [
                { "dimensions": [{ "name": "https://example.com/services" }], "metrics": [120.0] },
                { "dimensions": [{ "name": "https://example.com/" }], "metrics": [80.0] },
                { "bogus": true }
            ]
        });
        let pages = extract_top_pages(&v);
        assert_eq!(
            pages,
            vec![
                TopPage { url: "https://example.com/services".to_string(), views: 120 },
                TopPage { url: "https://example.com/".to_string(), views: 80 },
            ]
        );
        assert!(extract_top_pages(&json!({})).is_empty());
    }

    #[test]
    fn report_formatting() {
        let report = MetricsReport {
            period: Period::parse_at("2025-01-01..2025-01-31", day(2025, 3, 15)),
            visits: 1234,
            users: 567,
            page_views: 8901,
            top_pages: (0..7)
                .map(|i| TopPage {
                    url: format!("https://example.com/page{i}"),
                    views: 100 - i,
                })
                .collect(),
        };

        let text = format_report(&report);
        assert!(text.contains("Report for 2025-01-01 - 2025-01-31"));
        assert!(text.contains("👥 <b>Users:</b> 567"));
        assert!(text.contains("🔄 <b>Visits:</b> 1,234"));
        assert!(text.contains("📄 <b>Page views:</b> 8,901"));
        // Only the top 5 of the 7 fetched pages are shown, host stripped.
        assert!(text.contains("1. /page0 - 100"));
        assert!(text.contains("5. /page4 - 96"));
        assert!(!text.contains("/page5"));
    }

    #[test]
    fn single_day_report_header_has_no_range() {
        let report = MetricsReport {
            period: Period::parse_at("2025-01-15", day(2025, 3, 15)),
            visits: 1,
            users: 1,
            page_views: 1,
            top_pages: Vec::new(),
        };
        assert!(format_report(&report).contains("Report for 2025-01-15</b>"));
    }

    #[test]
    fn last_full_week_is_monday_through_sunday() {
        // 2025-01-15 is a Wednesday; the last full week is Jan 6-12.
        let p = last_full_week(day(2025, 1, 15));
        assert_eq!((p.start, p.end), (day(2025, 1, 6), day(2025, 1, 12)));

        // On a Monday the week that just started does not count.
        let p = last_full_week(day(2025, 1, 13));
        assert_eq!((p.start, p.end), (day(2025, 1, 6), day(2025, 1, 12)));

        // On a Sunday the current week is still incomplete.
        let p = last_full_week(day(2025, 1, 12));
        assert_eq!((p.start, p.end), (day(2024, 12, 30), day(2025, 1, 5)));

        for today in (0..14).map(|i| day(2025, 2, 1) + chrono::Duration::days(i)) {
            let p = last_full_week(today);
            assert_eq!(p.start.weekday(), Weekday::Mon);
            assert_eq!(p.end.weekday(), Weekday::Sun);
            assert_eq!(p.end - p.start, chrono::Duration::days(6));
            assert!(p.end < today);
        }
    }
}
