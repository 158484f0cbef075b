//! Reporting-period parser for the `/stats` command.

use chrono::{Duration, Local, NaiveDate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodKind {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    Month,
    Custom,
}

/// An inclusive calendar-date range. No time-of-day component; "now" is the
/// host's local date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period {
    pub kind: PeriodKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// True when the input matched no rule and the parser fell back to today.
    /// The fallback itself is kept (unparseable input never errors), but
    /// callers can tell it apart from an explicit `today`.
    pub was_fallback: bool,
}

impl Period {
    pub fn parse(token: &str) -> Self {
        Self::parse_at(token, Local::now().date_naive())
    }

    /// Deterministic core of [`Period::parse`]. Rules, first match wins:
    /// `today`, `yesterday`, `7d`, `30d`, `YYYY-MM` (whole month),
    /// `YYYY-MM-DD` (single day), `YYYY-MM-DD..YYYY-MM-DD` (verbatim range,
    /// ordering not enforced), anything else falls back to today.
    pub fn parse_at(token: &str, today: NaiveDate) -> Self {
        let token = token.trim();
        match token {
            "today" => Self::span(PeriodKind::Today, today, today),
            "yesterday" => {
                let d = today - Duration::days(1);
                Self::span(PeriodKind::Yesterday, d, d)
            }
            "7d" => Self::span(PeriodKind::Last7Days, today - Duration::days(7), today),
            "30d" => Self::span(PeriodKind::Last30Days, today - Duration::days(30), today),
            _ => parse_month(token)
                .or_else(|| parse_range(token))
                .unwrap_or(Self {
                    kind: PeriodKind::Today,
                    start: today,
                    end: today,
                    was_fallback: true,
                }),
        }
    }

    fn span(kind: PeriodKind, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            kind,
            start,
            end,
            was_fallback: false,
        }
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// `YYYY-MM`, exactly 4+2 digits.
fn parse_month(token: &str) -> Option<Period> {
    let (y, m) = token.split_once('-')?;
    if y.len() != 4 || m.len() != 2 || !all_digits(y) || !all_digits(m) {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    // Last day of the month: first day of the following month, one day back.
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(Period::span(PeriodKind::Month, start, next - Duration::days(1)))
}

/// `YYYY-MM-DD` or `YYYY-MM-DD..YYYY-MM-DD`. A single date doubles as both
/// ends; two dates are taken verbatim.
fn parse_range(token: &str) -> Option<Period> {
    let (start, end) = match token.split_once("..") {
        Some((a, b)) => (parse_day(a)?, parse_day(b)?),
        None => {
            let d = parse_day(token)?;
            (d, d)
        }
    };
    Some(Period::span(PeriodKind::Custom, start, end))
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2025, 3, 15)
    }

    #[test]
    fn today_and_yesterday() {
        let p = Period::parse_at("today", today());
        assert_eq!((p.kind, p.start, p.end), (PeriodKind::Today, today(), today()));
        assert!(!p.was_fallback);

        let p = Period::parse_at("yesterday", today());
        assert_eq!(p.start, day(2025, 3, 14));
        assert_eq!(p.end, day(2025, 3, 14));
    }

    #[test]
    fn relative_windows() {
        let p = Period::parse_at("7d", today());
        assert_eq!((p.start, p.end), (day(2025, 3, 8), today()));

        let p = Period::parse_at("30d", today());
        assert_eq!((p.start, p.end), (day(2025, 2, 13), today()));
    }

    #[test]
    fn month_end_is_last_calendar_day() {
        // Every month of a leap and a non-leap year: the day after `end`
        // must belong to the next month.
        for year in [2024, 2025] {
            for month in 1..=12 {
                let p = Period::parse_at(&format!("{year}-{month:02}"), today());
                assert_eq!(p.kind, PeriodKind::Month);
                assert_eq!(p.start.day(), 1);
                assert_eq!(p.end.month(), p.start.month());
                assert_ne!((p.end + Duration::days(1)).month(), p.start.month());
            }
        }
        assert_eq!(Period::parse_at("2024-02", today()).end, day(2024, 2, 29));
        assert_eq!(Period::parse_at("2025-02", today()).end, day(2025, 2, 28));
    }

    #[test]
    fn explicit_range_is_verbatim() {
        let p = Period::parse_at("2025-01-15..2025-01-20", today());
        assert_eq!((p.kind, p.start, p.end), (PeriodKind::Custom, day(2025, 1, 15), day(2025, 1, 20)));

        // Ordering is not enforced; the caller owns that.
        let p = Period::parse_at("2025-01-20..2025-01-15", today());
        assert_eq!((p.start, p.end), (day(2025, 1, 20), day(2025, 1, 15)));
    }

    #[test]
    fn single_day() {
        let p = Period::parse_at("2025-01-15", today());
        assert_eq!((p.kind, p.start, p.end), (PeriodKind::Custom, day(2025, 1, 15), day(2025, 1, 15)));
    }

    #[test]
    fn fallback_law() {
        let explicit = Period::parse_at("today", today());
        for garbage in ["", "lol", "2025-1", "2025-13", "2025-01-15..bogus", "7days"] {
            let p = Period::parse_at(garbage, today());
            assert_eq!((p.start, p.end), (explicit.start, explicit.end), "input {garbage:?}");
            assert!(p.was_fallback, "input {garbage:?}");
        }
        assert!(!explicit.was_fallback);
    }
}
