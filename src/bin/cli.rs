use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use attention::analysis::{self, ReportOptions};
use attention::error::ParseError;
use attention::fetch;
use attention::output;
use attention::utils::dates;
use attention::utils::text::split_codes;
use chrono::NaiveDate;
use colored::Colorize;
use log::warn;
use rustyline::error::ReadlineError;
use structopt::StructOpt;

const PROMPT: &str = "請輸入今日已公布自結的股票代號（用空白分隔）：";

#[derive(Debug, StructOpt)]
#[structopt(
    name = "attention-cli",
    about = "Track attention-stock disclosures from TWSE and TPEx"
)]
struct Opt {
    /// Number of trading dates to analyze
    #[structopt(long, default_value = "6")]
    days: usize,

    /// Analysis end date (YYYY-MM-DD); defaults to today
    #[structopt(long)]
    date: Option<NaiveDate>,

    /// CSV output path (defaults to output/attention_<start>_<end>.csv)
    #[structopt(long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Codes already announced today, comma or space separated; skips the
    /// interactive prompt
    #[structopt(long)]
    announced: Option<String>,

    /// Keep securities that fired no trigger in the report
    #[structopt(long)]
    include_untriggered: bool,

    /// Only show securities whose last attention date is the newest one
    #[structopt(long)]
    latest_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    if opt.days == 0 {
        bail!("--days must be a positive integer");
    }

    let announced = collect_announced(&opt)?;

    let outcome = fetch::fetch_all(opt.date).await?;
    for warning in &outcome.warnings {
        warn!("{warning}");
        eprintln!("{} {warning}", "warning:".yellow());
    }
    if outcome.rows.is_empty() {
        return Err(ParseError::NoData.into());
    }

    let (rows, window) = dates::filter_by_latest_dates(outcome.rows, opt.days);
    if rows.is_empty() {
        warn!("no rows within the latest {} trading dates", opt.days);
        println!("No disclosures within the requested date window.");
        return Ok(());
    }

    let options = ReportOptions {
        include_untriggered: opt.include_untriggered,
    };
    let mut records = analysis::build_report(&rows, &announced, options);

    if opt.latest_only {
        if let Some(newest) = records.iter().map(|record| record.last_date).max() {
            records.retain(|record| record.last_date == newest);
        }
    }

    output::print_table(&records);
    let path = output::write_csv(&records, opt.output.clone(), &window)?;
    println!("CSV saved to {}", path.display());
    Ok(())
}

fn collect_announced(opt: &Opt) -> Result<HashSet<String>> {
    let raw = match &opt.announced {
        Some(value) => value.clone(),
        None => {
            let mut editor = rustyline::DefaultEditor::new()?;
            match editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => String::new(),
                Err(err) => return Err(err.into()),
            }
        }
    };
    Ok(split_codes(&raw).into_iter().collect())
}
