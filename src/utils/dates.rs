use std::collections::HashSet;

use chrono::NaiveDate;
use itertools::Itertools;

use crate::error::ParseError;
use crate::parse::AttentionRow;
use crate::utils::text::clean_text;

/// ROC calendar year 1 is 1912 CE.
pub const ROC_YEAR_OFFSET: i32 = 1911;

/// Parses a ROC-calendar date token, `114/5/20` or `114.5.20`. The two
/// venues disagree only on the separator, so `.` is folded into `/` before
/// splitting.
pub fn parse_roc_date(token: &str) -> Result<NaiveDate, ParseError> {
    let malformed = || ParseError::MalformedDate(token.to_string());
    let normalized = clean_text(token).replace('.', "/");
    let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() != 3 {
        return Err(malformed());
    }
    let roc_year: i32 = parts[0].trim().parse().map_err(|_| malformed())?;
    let month: u32 = parts[1].trim().parse().map_err(|_| malformed())?;
    let day: u32 = parts[2].trim().parse().map_err(|_| malformed())?;
    NaiveDate::from_ymd_opt(roc_year + ROC_YEAR_OFFSET, month, day).ok_or_else(malformed)
}

/// Distinct dates present in `rows`, newest first.
pub fn distinct_dates_desc(rows: &[AttentionRow]) -> Vec<NaiveDate> {
    rows.iter()
        .map(|row| row.date)
        .unique()
        .sorted_by(|a, b| b.cmp(a))
        .collect()
}

/// The `k` most recent distinct dates in `rows`, newest first.
pub fn latest_dates(rows: &[AttentionRow], k: usize) -> Vec<NaiveDate> {
    let mut dates = distinct_dates_desc(rows);
    dates.truncate(k);
    dates
}

/// Restricts `rows` to those on the latest `n` distinct dates and returns the
/// window dates alongside the surviving rows.
pub fn filter_by_latest_dates(rows: Vec<AttentionRow>, n: usize) -> (Vec<AttentionRow>, Vec<NaiveDate>) {
    let window = latest_dates(&rows, n);
    let window_set: HashSet<NaiveDate> = window.iter().copied().collect();
    let filtered = rows
        .into_iter()
        .filter(|row| window_set.contains(&row.date))
        .collect();
    (filtered, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Market;

    fn row(code: &str, date: NaiveDate) -> AttentionRow {
        AttentionRow {
            market: Market::Tse,
            code: code.to_string(),
            name: format!("股票{code}"),
            date,
            remark: String::new(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn both_separators_yield_the_same_date() {
        let slash = parse_roc_date("114/5/20").unwrap();
        let dotted = parse_roc_date("114.5.20").unwrap();
        assert_eq!(slash, dotted);
        assert_eq!(slash, ymd(2025, 5, 20));
    }

    #[test]
    fn zero_padded_tokens_parse() {
        assert_eq!(parse_roc_date(" 113/01/02 ").unwrap(), ymd(2024, 1, 2));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "114/05", "114/05/20/1", "20250520", "一一四/五/二十", "114/13/01", "114/02/30"] {
            assert!(
                matches!(parse_roc_date(token), Err(ParseError::MalformedDate(_))),
                "token {token:?} should not parse"
            );
        }
    }

    #[test]
    fn latest_dates_are_distinct_sorted_and_capped() {
        let rows = vec![
            row("2330", ymd(2025, 5, 19)),
            row("2317", ymd(2025, 5, 21)),
            row("2330", ymd(2025, 5, 21)),
            row("6488", ymd(2025, 5, 16)),
            row("3008", ymd(2025, 5, 20)),
        ];
        assert_eq!(
            latest_dates(&rows, 3),
            vec![ymd(2025, 5, 21), ymd(2025, 5, 20), ymd(2025, 5, 19)]
        );
        assert_eq!(latest_dates(&rows, 10).len(), 4);
        assert!(latest_dates(&rows, 0).is_empty());

        // Idempotent under duplication and reordering.
        let mut doubled = rows.clone();
        doubled.extend(rows.iter().rev().cloned());
        assert_eq!(latest_dates(&doubled, 3), latest_dates(&rows, 3));
    }

    #[test]
    fn filter_keeps_only_window_rows() {
        let rows = vec![
            row("2330", ymd(2025, 5, 21)),
            row("2317", ymd(2025, 5, 20)),
            row("6488", ymd(2025, 5, 12)),
        ];
        let (filtered, window) = filter_by_latest_dates(rows, 2);
        assert_eq!(window, vec![ymd(2025, 5, 21), ymd(2025, 5, 20)]);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.date >= ymd(2025, 5, 20)));
    }
}
