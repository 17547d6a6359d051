//! Date bounds and period labels.
//!
//! Users type bounds at whatever granularity they think in (`2020`,
//! `2020-06`, `2020-06-15`). A start bound resolves to the first day of the
//! period it names and an end bound to the last day, so `--start 2020
//! --end 2020` covers the whole year.
//!
//! SDMX period labels (`2024-01`, `2024-Q1`, ...) map to the first day of
//! the period.

use chrono::{Datelike, Months, NaiveDate};

use crate::domain::Frequency;

/// Which side of a window a user-supplied bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Start,
    End,
}

/// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD` into a concrete date.
pub fn parse_date_bound(raw: &str, kind: BoundKind) -> Result<NaiveDate, String> {
    let s = raw.trim();
    let err = || {
        format!("Invalid date '{s}'. Expected one of: YYYY, YYYY-MM, YYYY-MM-DD.")
    };

    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y] => {
            let year = parse_year(y).ok_or_else(err)?;
            let (month, day) = match kind {
                BoundKind::Start => (1, 1),
                BoundKind::End => (12, 31),
            };
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err)
        }
        [y, m] => {
            let year = parse_year(y).ok_or_else(err)?;
            let month = parse_month(m).ok_or_else(err)?;
            let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(err)?;
            match kind {
                BoundKind::Start => Ok(first),
                BoundKind::End => last_day_of_month(first).ok_or_else(err),
            }
        }
        [_, _, _] => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| err()),
        _ => Err(err()),
    }
}

/// Map an SDMX `TIME_PERIOD` label to the first day of the period.
///
/// Supports annual (`2024`), semester (`2024-S2`), quarterly (`2024-Q3`),
/// monthly (`2024-07`) and daily (`2024-07-15`) labels.
pub fn parse_period_label(label: &str) -> Option<NaiveDate> {
    let s = label.trim();
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y] => NaiveDate::from_ymd_opt(parse_year(y)?, 1, 1),
        [y, p] => {
            let year = parse_year(y)?;
            let month = if let Some(q) = p.strip_prefix('Q') {
                let q: u32 = q.parse().ok().filter(|q| (1..=4).contains(q))?;
                (q - 1) * 3 + 1
            } else if let Some(h) = p.strip_prefix('S') {
                let h: u32 = h.parse().ok().filter(|h| (1..=2).contains(h))?;
                (h - 1) * 6 + 1
            } else {
                parse_month(p)?
            };
            NaiveDate::from_ymd_opt(year, month, 1)
        }
        [_, _, _] => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
        _ => None,
    }
}

/// Format a date at the granularity a source expects for a series of `frequency`.
pub fn format_period(date: NaiveDate, frequency: Frequency) -> String {
    match frequency {
        Frequency::Daily => date.format("%Y-%m-%d").to_string(),
        Frequency::Monthly => date.format("%Y-%m").to_string(),
    }
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_month(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|m| (1..=12).contains(m))
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let next = first.checked_add_months(Months::new(1))?;
    next.pred_opt().filter(|d| d.month() == first.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bounds_resolve_by_granularity() {
        assert_eq!(parse_date_bound("2020", BoundKind::Start).unwrap(), d(2020, 1, 1));
        assert_eq!(parse_date_bound("2020", BoundKind::End).unwrap(), d(2020, 12, 31));
        assert_eq!(parse_date_bound("2024-02", BoundKind::Start).unwrap(), d(2024, 2, 1));
        assert_eq!(parse_date_bound("2024-02", BoundKind::End).unwrap(), d(2024, 2, 29));
        assert_eq!(parse_date_bound("2023-12", BoundKind::End).unwrap(), d(2023, 12, 31));
        assert_eq!(
            parse_date_bound(" 2024-06-15 ", BoundKind::End).unwrap(),
            d(2024, 6, 15)
        );
    }

    #[test]
    fn bounds_reject_garbage() {
        for bad in ["", "20", "2024-13", "2024-02-30", "abcd", "2024/01/01", "2024-1-1-1"] {
            assert!(parse_date_bound(bad, BoundKind::Start).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn period_labels_map_to_period_start() {
        assert_eq!(parse_period_label("2024"), Some(d(2024, 1, 1)));
        assert_eq!(parse_period_label("2024-07"), Some(d(2024, 7, 1)));
        assert_eq!(parse_period_label("2024-Q3"), Some(d(2024, 7, 1)));
        assert_eq!(parse_period_label("2024-S2"), Some(d(2024, 7, 1)));
        assert_eq!(parse_period_label("2024-07-15"), Some(d(2024, 7, 15)));
        assert_eq!(parse_period_label("2024-Q5"), None);
        assert_eq!(parse_period_label("2024-W01"), None);
    }

    #[test]
    fn periods_format_by_frequency() {
        assert_eq!(format_period(d(2024, 6, 30), Frequency::Monthly), "2024-06");
        assert_eq!(format_period(d(2024, 6, 30), Frequency::Daily), "2024-06-30");
    }
}
