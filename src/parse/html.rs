//! HTML-table strategy. The OTC page merges repeated code/name cells with
//! rowspan and splits multi-clause remarks across `<br>` segments, so every
//! table is first expanded into a plain rectangular grid (merged values
//! carried into each row and column they cover) before the shared header
//! mapping runs. Tables are tried in document order; the first one that maps
//! cleanly wins.

use scraper::{ElementRef, Html, Selector};

use super::{rows_from_grid, Market, ParseReport};
use crate::error::ParseError;
use crate::utils::text::clean_text;

struct Cell {
    text: String,
    rowspan: usize,
    colspan: usize,
}

struct CarriedCell {
    text: String,
    remaining: usize,
}

pub(super) fn parse(html_text: &str, market: Market) -> Result<ParseReport, ParseError> {
    let document = Html::parse_document(html_text);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    for table in document.select(&table_selector) {
        let mut raw_rows: Vec<Vec<Cell>> = Vec::new();
        for tr in table.select(&row_selector) {
            let cells: Vec<Cell> = tr.select(&cell_selector).map(read_cell).collect();
            if !cells.is_empty() {
                raw_rows.push(cells);
            }
        }
        let grid = expand_grid(&raw_rows);
        if let Ok(report) = rows_from_grid(&grid, market) {
            return Ok(report);
        }
    }
    Err(ParseError::Structure(
        "no attention table in HTML document".into(),
    ))
}

fn read_cell(element: ElementRef) -> Cell {
    // Text nodes around <br> arrive as separate fragments; joining on a
    // space keeps every clause segment in one remark string.
    let joined = element.text().collect::<Vec<_>>().join(" ");
    Cell {
        text: clean_text(&joined),
        rowspan: span_attr(element, "rowspan"),
        colspan: span_attr(element, "colspan"),
    }
}

fn span_attr(element: ElementRef, name: &str) -> usize {
    element
        .value()
        .attr(name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&span| span >= 1)
        .unwrap_or(1)
}

/// Resolves rowspan/colspan ellipsis into a fully-populated grid: a single
/// carry-forward pass, left to right then top to bottom, with per-column
/// pending state for cells that span downward.
fn expand_grid(rows: &[Vec<Cell>]) -> Vec<Vec<String>> {
    let mut expanded: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    let mut carry: Vec<Option<CarriedCell>> = Vec::new();

    for row in rows {
        let mut out: Vec<String> = Vec::new();
        let mut col = 0usize;
        for cell in row {
            drain_carry(&mut out, &mut carry, &mut col);
            for _ in 0..cell.colspan {
                out.push(cell.text.clone());
                if cell.rowspan > 1 {
                    if col >= carry.len() {
                        carry.resize_with(col + 1, || None);
                    }
                    carry[col] = Some(CarriedCell {
                        text: cell.text.clone(),
                        remaining: cell.rowspan - 1,
                    });
                }
                col += 1;
            }
        }
        drain_carry(&mut out, &mut carry, &mut col);
        expanded.push(out);
    }
    expanded
}

fn drain_carry(out: &mut Vec<String>, carry: &mut [Option<CarriedCell>], col: &mut usize) {
    while *col < carry.len() {
        match carry[*col].as_mut() {
            Some(pending) => {
                out.push(pending.text.clone());
                pending.remaining -= 1;
                if pending.remaining == 0 {
                    carry[*col] = None;
                }
                *col += 1;
            }
            None => break,
        }
    }
}
