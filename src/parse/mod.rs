//! Venue document parsing into the unified attention-row schema.
//!
//! Each venue publishes the same disclosure twice: a delimited text export
//! (CP950/Big5) and an HTML page. Both strategies reduce the document to a
//! rectangular string grid and share the header-driven column mapping here;
//! the caller composes the tabular-then-HTML fallback.

mod html;
mod tabular;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::utils::dates::parse_roc_date;
use crate::utils::text::{clean_cell, clean_text, normalize_header};

/// Disclosure venue. `Tse` is the listed market (TWSE), `Otc` the
/// over-the-counter market (TPEx). Declaration order doubles as the report
/// sort order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    #[strum(serialize = "TSE")]
    Tse,
    #[strum(serialize = "OTC")]
    Otc,
}

/// One disclosure line in the unified schema. The date is canonical
/// (common-era) by the time a row leaves the parser; no ROC token escapes
/// this module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionRow {
    pub market: Market,
    pub code: String,
    pub name: String,
    pub date: NaiveDate,
    pub remark: String,
}

/// Successful parse of one venue document. `skipped` counts data rows
/// dropped for malformed dates, surfaced for diagnostics.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub rows: Vec<AttentionRow>,
    pub skipped: usize,
}

pub fn parse_tabular(text: &str, market: Market) -> Result<ParseReport, ParseError> {
    tabular::parse(text, market)
}

pub fn parse_html(html_text: &str, market: Market) -> Result<ParseReport, ParseError> {
    html::parse(html_text, market)
}

const CODE_HEADER: &str = "證券代號";
const NAME_HEADER: &str = "證券名稱";
const REMARK_HEADER: &str = "注意交易資訊";
const DATE_HEADERS: [&str; 2] = ["日期", "公告日期"];

fn find_header_row(grid: &[Vec<String>]) -> Option<usize> {
    grid.iter().position(|row| {
        let normalized: Vec<String> = row.iter().map(|cell| normalize_header(cell)).collect();
        [CODE_HEADER, NAME_HEADER, REMARK_HEADER]
            .iter()
            .all(|required| normalized.iter().any(|header| header == required))
    })
}

/// Maps a fully-expanded string grid onto [`AttentionRow`]s. Column positions
/// differ between the venues, so they are resolved from the header row by
/// name rather than assumed.
pub(crate) fn rows_from_grid(grid: &[Vec<String>], market: Market) -> Result<ParseReport, ParseError> {
    let header_idx = find_header_row(grid)
        .ok_or_else(|| ParseError::Structure("attention header row not found".into()))?;
    let headers: Vec<String> = grid[header_idx]
        .iter()
        .map(|cell| normalize_header(cell))
        .collect();
    let index_of = |name: &str| headers.iter().position(|header| header == name);

    let missing = |name: &str| ParseError::Structure(format!("required column {name} not found"));
    let code_idx = index_of(CODE_HEADER).ok_or_else(|| missing(CODE_HEADER))?;
    let name_idx = index_of(NAME_HEADER).ok_or_else(|| missing(NAME_HEADER))?;
    let remark_idx = index_of(REMARK_HEADER).ok_or_else(|| missing(REMARK_HEADER))?;
    let date_idx = DATE_HEADERS
        .iter()
        .find_map(|header| index_of(header))
        .ok_or_else(|| missing("日期"))?;

    let needed = code_idx.max(name_idx).max(remark_idx).max(date_idx);
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for cells in &grid[header_idx + 1..] {
        if cells.len() <= needed {
            continue;
        }
        let code = clean_cell(&cells[code_idx]);
        if code.is_empty() {
            // Footnote and padding rows carry no code.
            continue;
        }
        let date = match parse_roc_date(&cells[date_idx]) {
            Ok(date) => date,
            Err(err) => {
                log::debug!("{market}: dropping row for {code}: {err}");
                skipped += 1;
                continue;
            }
        };
        rows.push(AttentionRow {
            market,
            code,
            name: clean_cell(&cells[name_idx]),
            date,
            remark: clean_text(&cells[remark_idx]),
        });
    }

    if rows.is_empty() {
        return Err(ParseError::Structure(format!(
            "no usable data rows ({skipped} skipped)"
        )));
    }
    Ok(ParseReport { rows, skipped })
}
