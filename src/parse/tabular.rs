//! Delimited-text strategy. The venue exports lead with title and legend
//! lines before the real header, and wrap codes in an Excel text guard, so
//! the reader stays header-less and flexible and the shared grid mapping
//! locates the header row itself.

use csv::ReaderBuilder;

use super::{rows_from_grid, Market, ParseReport};
use crate::error::ParseError;

pub(super) fn parse(text: &str, market: Market) -> Result<ParseReport, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|err| ParseError::Structure(format!("unreadable delimited line: {err}")))?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().any(|cell| !cell.trim().is_empty()) {
            grid.push(cells);
        }
    }
    rows_from_grid(&grid, market)
}
