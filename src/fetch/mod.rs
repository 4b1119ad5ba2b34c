//! Venue document retrieval.
//!
//! Each venue is asked for its delimited export first (declared CP950/Big5)
//! and falls back to the HTML page (UTF-8) exactly once when the export does
//! not decode, lacks the expected shape, or yields no rows. A venue that
//! fails both forms is reported as a warning; the run proceeds on whatever
//! the other venue returned.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use encoding_rs::BIG5;
use log::{debug, warn};
use reqwest::Client;
use url::Url;

use crate::error::ParseError;
use crate::parse::{self, AttentionRow, Market, ParseReport};

const TSE_NOTICE_URL: &str = "https://www.twse.com.tw/rwd/zh/announcement/notice";
const OTC_ATTENTION_URL: &str = "https://www.tpex.org.tw/www/zh-tw/bulletin/attention";
const USER_AGENT: &str = "attention-monitor/0.1";

/// Request range is padded well past the six-date trigger window so enough
/// trading dates come back around weekends and market holidays.
pub const FETCH_RANGE_DAYS: i64 = 30;

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub rows: Vec<AttentionRow>,
    pub warnings: Vec<String>,
}

pub fn build_date_range(end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
    (end - Duration::days(FETCH_RANGE_DAYS), end)
}

/// Strict Big5 decode; a single unmappable byte fails the tabular attempt so
/// the caller falls back to the HTML form rather than corrupting remarks.
pub fn decode_big5(bytes: &[u8]) -> Result<String, ParseError> {
    let (text, _, had_errors) = BIG5.decode(bytes);
    if had_errors {
        return Err(ParseError::Decode { encoding: "Big5" });
    }
    Ok(text.into_owned())
}

pub async fn fetch_all(end: Option<NaiveDate>) -> Result<FetchOutcome> {
    let (start, end) = build_date_range(end);
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")?;

    let (tse, otc) = tokio::join!(
        fetch_tse(&client, start, end),
        fetch_otc(&client, start, end)
    );

    let mut combined = tse;
    combined.rows.extend(otc.rows);
    combined.warnings.extend(otc.warnings);
    Ok(combined)
}

pub async fn fetch_tse(client: &Client, start: NaiveDate, end: NaiveDate) -> FetchOutcome {
    let params = |response: &str| {
        vec![
            ("querytype", "1".to_string()),
            ("stockNo", String::new()),
            ("selectType", String::new()),
            ("startDate", start.format("%Y%m%d").to_string()),
            ("endDate", end.format("%Y%m%d").to_string()),
            ("sortKind", "STKNO".to_string()),
            ("response", response.to_string()),
        ]
    };
    fetch_venue(client, Market::Tse, TSE_NOTICE_URL, params("csv"), params("html")).await
}

pub async fn fetch_otc(client: &Client, start: NaiveDate, end: NaiveDate) -> FetchOutcome {
    let params = |response: &str| {
        vec![
            ("startDate", start.format("%Y/%m/%d").to_string()),
            ("endDate", end.format("%Y/%m/%d").to_string()),
            ("code", String::new()),
            ("cate", String::new()),
            ("type", "all".to_string()),
            ("order", "date".to_string()),
            ("id", String::new()),
            ("response", response.to_string()),
        ]
    };
    fetch_venue(client, Market::Otc, OTC_ATTENTION_URL, params("csv"), params("html")).await
}

async fn fetch_venue(
    client: &Client,
    market: Market,
    url: &str,
    tabular_params: Vec<(&str, String)>,
    html_params: Vec<(&str, String)>,
) -> FetchOutcome {
    let mut warnings = Vec::new();

    match tabular_attempt(client, market, url, &tabular_params).await {
        Ok(report) => return report_to_outcome(market, report, warnings),
        Err(err) => warnings.push(format!("{market} tabular form failed: {err:#}")),
    }
    match html_attempt(client, market, url, &html_params).await {
        Ok(report) => return report_to_outcome(market, report, warnings),
        Err(err) => warnings.push(format!("{market} HTML form failed: {err:#}")),
    }

    FetchOutcome { rows: Vec::new(), warnings }
}

fn report_to_outcome(market: Market, report: ParseReport, warnings: Vec<String>) -> FetchOutcome {
    if report.skipped > 0 {
        warn!("{market}: skipped {} malformed rows", report.skipped);
    }
    debug!("{market}: parsed {} rows", report.rows.len());
    FetchOutcome { rows: report.rows, warnings }
}

async fn tabular_attempt(
    client: &Client,
    market: Market,
    url: &str,
    params: &[(&str, String)],
) -> Result<ParseReport> {
    let bytes = get_bytes(client, url, params).await?;
    let text = decode_big5(&bytes)?;
    Ok(parse::parse_tabular(&text, market)?)
}

async fn html_attempt(
    client: &Client,
    market: Market,
    url: &str,
    params: &[(&str, String)],
) -> Result<ParseReport> {
    let bytes = get_bytes(client, url, params).await?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(parse::parse_html(&text, market)?)
}

async fn get_bytes(client: &Client, url: &str, params: &[(&str, String)]) -> Result<Vec<u8>> {
    let url = Url::parse_with_params(url, params.iter().map(|(k, v)| (*k, v.as_str())))
        .context("building venue URL")?;
    debug!("GET {url}");
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
