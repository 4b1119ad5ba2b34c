//! Console table and the CSV artifact.
//!
//! The artifact is UTF-8 with a byte-order mark and wraps codes in the Excel
//! text guard so spreadsheet imports keep leading zeros. Absent numerics are
//! an empty string in the file and a dash on the console.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;

use crate::analysis::{AggregateRecord, Risk};

pub const COLUMNS: [&str; 10] = [
    "市場",
    "代號",
    "名稱",
    "最後注意日",
    "觸發原因",
    "六日內次數",
    "最大量增倍數",
    "最大漲幅(%)",
    "第一款",
    "狀態",
];

fn format_number(value: Option<f64>, missing: &str) -> String {
    match value {
        Some(number) => {
            let text = format!("{number:.2}");
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        None => missing.to_string(),
    }
}

fn build_rows(records: &[AggregateRecord], missing: &str, for_excel: bool) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            let code = if for_excel {
                format!("=\"{}\"", record.code)
            } else {
                record.code.clone()
            };
            vec![
                record.market.to_string(),
                code,
                record.name.clone(),
                record.last_date.format("%Y-%m-%d").to_string(),
                record.reason_text(),
                record.window_count.to_string(),
                format_number(record.volume_multiple, missing),
                format_number(record.gain_percent, missing),
                if record.first_clause_ever { "1" } else { "0" }.to_string(),
                record.status.to_string(),
            ]
        })
        .collect()
}

pub fn print_table(records: &[AggregateRecord]) {
    let header = COLUMNS
        .iter()
        .map(|column| column.bold().to_string())
        .collect::<Vec<_>>()
        .join(" | ");
    println!("{header}");
    for (record, cells) in records.iter().zip(build_rows(records, "-", false)) {
        let line = cells.join(" | ");
        match record.risk {
            Risk::High => println!("{}", line.red()),
            Risk::Low => println!("{}", line.green()),
        }
    }
}

/// `output/attention_<start>_<end>.csv`, dates taken from the caller-facing
/// window.
fn default_filename(window: &[NaiveDate]) -> Result<PathBuf> {
    let start = window.iter().min().context("empty date window")?;
    let end = window.iter().max().context("empty date window")?;
    Ok(PathBuf::from("output").join(format!(
        "attention_{}_{}.csv",
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )))
}

pub fn write_csv(
    records: &[AggregateRecord],
    output_path: Option<PathBuf>,
    window: &[NaiveDate],
) -> Result<PathBuf> {
    let path = match output_path {
        Some(path) => path,
        None => default_filename(window)?,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let mut file =
        fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all("\u{feff}".as_bytes())?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(COLUMNS)?;
    for row in build_rows(records, "", true) {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(path)
}
