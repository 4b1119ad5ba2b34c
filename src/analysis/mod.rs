//! Trigger-rule evaluation over the combined venue rows.

pub mod signals;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::parse::{AttentionRow, Market};
use crate::utils::dates;
use signals::Signals;

/// Trigger window: the engine always looks at the latest six distinct
/// trading dates of the combined row set, independent of the caller-facing
/// `--days` restriction.
pub const TRIGGER_WINDOW_DATES: usize = 6;
pub const COUNT_TRIGGER_THRESHOLD: usize = 3;

pub const REASON_TRIPLE_ATTENTION: &str = "近六日三次注意";
pub const REASON_LATEST_CLAUSE: &str = "昨日第一至第三款";
pub const REASON_SEPARATOR: &str = "；";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum Status {
    #[strum(serialize = "(已) 已公告 (排除)")]
    Announced,
    #[strum(serialize = "(未) 未公告 (高風險)")]
    Unannounced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum Risk {
    #[strum(serialize = "低風險")]
    Low,
    #[strum(serialize = "高風險")]
    High,
}

/// One report line per surviving `(market, code)` pair. Built fresh on every
/// run and discarded after output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    pub market: Market,
    pub code: String,
    pub name: String,
    /// Newest date across all of the group's rows, not window-restricted.
    pub last_date: NaiveDate,
    pub reasons: Vec<String>,
    pub window_count: usize,
    pub volume_multiple: Option<f64>,
    pub gain_percent: Option<f64>,
    pub first_clause_ever: bool,
    pub status: Status,
    pub risk: Risk,
}

impl AggregateRecord {
    pub fn reason_text(&self) -> String {
        self.reasons.join(REASON_SEPARATOR)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Keep securities that fired no trigger. Off by default; the report
    /// exists to surface triggered codes.
    pub include_untriggered: bool,
}

/// Warrants and similar non-equity instruments carry five or more digits in
/// their codes and never receive the disclosure this tool tracks.
pub fn is_warrant(code: &str) -> bool {
    code.chars().filter(char::is_ascii_digit).count() >= 5
}

/// Pure cross-reference against the caller-supplied exclusion set.
pub fn assign_status(code: &str, announced: &HashSet<String>) -> (Status, Risk) {
    if announced.contains(code) {
        (Status::Announced, Risk::Low)
    } else {
        (Status::Unannounced, Risk::High)
    }
}

/// Evaluates the trigger rules and aggregates one record per `(market,
/// code)`, sorted by market (TSE first) then code.
///
/// The occurrence count only sees rows inside the six-date window whose
/// remark carries no clause 10; the TSE clause trigger instead looks at the
/// globally latest TSE date, window and clause 10 notwithstanding. The two
/// reference dates are computed separately on purpose.
pub fn build_report(
    rows: &[AttentionRow],
    announced: &HashSet<String>,
    options: ReportOptions,
) -> Vec<AggregateRecord> {
    if rows.is_empty() {
        return Vec::new();
    }

    let window: HashSet<NaiveDate> = dates::latest_dates(rows, TRIGGER_WINDOW_DATES)
        .into_iter()
        .collect();
    let latest_tse_date = rows
        .iter()
        .filter(|row| row.market == Market::Tse)
        .map(|row| row.date)
        .max();

    let mut grouped: HashMap<(Market, String), Vec<(&AttentionRow, Signals)>> = HashMap::new();
    for row in rows {
        grouped
            .entry((row.market, row.code.clone()))
            .or_default()
            .push((row, Signals::derive(&row.remark)));
    }

    let mut records = Vec::new();
    for ((market, code), items) in grouped {
        if is_warrant(&code) {
            continue;
        }
        let Some((latest_row, _)) = items.iter().max_by_key(|(row, _)| row.date) else {
            continue;
        };

        let window_count = items
            .iter()
            .filter(|(row, signals)| window.contains(&row.date) && !signals.clause_10)
            .count();

        let latest_clause_hit = market == Market::Tse
            && latest_tse_date.map_or(false, |latest| {
                items
                    .iter()
                    .any(|(row, signals)| row.date == latest && signals.clause_1_to_3)
            });

        let mut reasons = Vec::new();
        if window_count >= COUNT_TRIGGER_THRESHOLD {
            reasons.push(REASON_TRIPLE_ATTENTION.to_string());
        }
        if latest_clause_hit {
            reasons.push(REASON_LATEST_CLAUSE.to_string());
        }
        if reasons.is_empty() && !options.include_untriggered {
            continue;
        }

        let (status, risk) = assign_status(&code, announced);
        records.push(AggregateRecord {
            market,
            code,
            name: latest_row.name.clone(),
            last_date: latest_row.date,
            reasons,
            window_count,
            volume_multiple: signals::numeric_max(
                items.iter().filter_map(|(_, s)| s.volume_multiple),
            ),
            gain_percent: signals::numeric_max(items.iter().filter_map(|(_, s)| s.gain_percent)),
            first_clause_ever: items.iter().any(|(_, s)| s.first_clause),
            status,
            risk,
        });
    }

    records.sort_by(|a, b| a.market.cmp(&b.market).then_with(|| a.code.cmp(&b.code)));
    records
}
