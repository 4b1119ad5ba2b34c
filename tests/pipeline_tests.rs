//! End-to-end pipeline over synthetic venue documents: tabular TSE export,
//! HTML OTC page, combined window restriction, rule evaluation, and the CSV
//! artifact.

use std::collections::HashSet;
use std::fs;

use attention::analysis::{
    build_report, AggregateRecord, ReportOptions, Risk, Status, REASON_LATEST_CLAUSE,
    REASON_TRIPLE_ATTENTION,
};
use attention::output;
use attention::parse::{parse_html, parse_tabular, Market};
use attention::utils::dates::filter_by_latest_dates;
use attention::AttentionRow;
use chrono::NaiveDate;
use tempfile::tempdir;

const TSE_EXPORT: &str = "\
本資料由臺灣證券交易所提供
\"證券代號\",\"證券名稱\",\"注意交易資訊\",\"日期\"
\"=\"\"2330\"\"\",\"台積電\",\"本日收盤價漲幅達6.52%，成交量較最近六十日平均成交量放大3倍\",\"114/05/15\"
\"=\"\"2330\"\"\",\"台積電\",\"本日成交量為最近六十日平均成交量之5.5倍\",\"114/05/16\"
\"=\"\"2330\"\"\",\"台積電\",\"最近六個營業日累積收盤價漲幅達28.66%\",\"114/05/19\"
\"=\"\"2330\"\"\",\"台積電\",\"第一款 本日收盤價漲幅達9.9%\",\"114/05/20\"
\"=\"\"2317\"\"\",\"鴻海\",\"第十款 本日週轉率10.2%\",\"114/05/20\"
\"=\"\"30066\"\"\",\"台積電購06\",\"漲幅達9%\",\"114/05/16\"
\"=\"\"30066\"\"\",\"台積電購06\",\"漲幅達9%\",\"114/05/19\"
\"=\"\"30066\"\"\",\"台積電購06\",\"漲幅達9%\",\"114/05/20\"
";

const OTC_PAGE: &str = r#"
<html><body>
<table><tr><td>首頁</td><td>上櫃公告</td></tr></table>
<table>
  <tr><th>公告日期</th><th>證券代號</th><th>證券名稱</th><th>注意交易資訊</th></tr>
  <tr>
    <td>114.05.19</td>
    <td rowspan="3">5274</td>
    <td rowspan="3">信驊</td>
    <td>第一款 本日收盤價漲幅達8.11%<br>週轉率與同類股不相當</td>
  </tr>
  <tr><td>114.05.20</td><td>成交量放大4倍</td></tr>
  <tr><td>114.05.20</td><td>漲幅達9.23%</td></tr>
  <tr><td>114.05.20</td><td>3105</td><td>穩懋</td><td>漲幅達6.02%</td></tr>
</table>
</body></html>
"#;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn combined_rows() -> Vec<AttentionRow> {
    let tse = parse_tabular(TSE_EXPORT, Market::Tse).unwrap();
    let otc = parse_html(OTC_PAGE, Market::Otc).unwrap();
    let mut rows = tse.rows;
    rows.extend(otc.rows);
    rows
}

fn run_pipeline() -> Vec<AggregateRecord> {
    let (rows, window) = filter_by_latest_dates(combined_rows(), 6);
    assert_eq!(window.first(), Some(&ymd(2025, 5, 20)));
    let announced: HashSet<String> = ["2330".to_string()].into_iter().collect();
    build_report(&rows, &announced, ReportOptions::default())
}

#[test]
fn pipeline_produces_the_expected_aggregates() {
    let records = run_pipeline();
    assert_eq!(records.len(), 2);

    let tsmc = &records[0];
    assert_eq!(tsmc.market, Market::Tse);
    assert_eq!(tsmc.code, "2330");
    assert_eq!(tsmc.name, "台積電");
    assert_eq!(tsmc.last_date, ymd(2025, 5, 20));
    assert_eq!(tsmc.window_count, 4);
    assert_eq!(tsmc.reasons, vec![REASON_TRIPLE_ATTENTION, REASON_LATEST_CLAUSE]);
    assert_eq!(tsmc.volume_multiple, Some(5.5));
    assert_eq!(tsmc.gain_percent, Some(28.66));
    assert!(tsmc.first_clause_ever);
    assert_eq!(tsmc.status, Status::Announced);
    assert_eq!(tsmc.risk, Risk::Low);

    let aspeed = &records[1];
    assert_eq!(aspeed.market, Market::Otc);
    assert_eq!(aspeed.code, "5274");
    assert_eq!(aspeed.last_date, ymd(2025, 5, 20));
    // Duplicate same-day disclosures each count.
    assert_eq!(aspeed.window_count, 3);
    assert_eq!(aspeed.reasons, vec![REASON_TRIPLE_ATTENTION]);
    assert_eq!(aspeed.volume_multiple, Some(4.0));
    assert_eq!(aspeed.gain_percent, Some(9.23));
    assert_eq!(aspeed.status, Status::Unannounced);
    assert_eq!(aspeed.risk, Risk::High);
}

#[test]
fn warrants_and_untriggered_codes_are_absent() {
    let records = run_pipeline();
    assert!(records.iter().all(|record| record.code != "30066"));
    assert!(records.iter().all(|record| record.code != "2317"));
    assert!(records.iter().all(|record| record.code != "3105"));
}

#[test]
fn repeated_runs_are_deterministic() {
    let first = run_pipeline();
    for _ in 0..5 {
        assert_eq!(run_pipeline(), first);
    }
}

#[test]
fn tabular_failure_falls_back_to_html() {
    // The caller composes try-tabular-else-HTML; a maintenance page on the
    // tabular form must not lose the venue.
    let garbled = "系統維護中";
    let report = parse_tabular(garbled, Market::Otc)
        .or_else(|_| parse_html(OTC_PAGE, Market::Otc))
        .unwrap();
    assert_eq!(report.rows.len(), 4);
}

#[test]
fn artifact_matches_the_report() {
    let records = run_pipeline();
    let dir = tempdir().unwrap();
    let path = dir.path().join("attention.csv");
    let written =
        output::write_csv(&records, Some(path.clone()), &[ymd(2025, 5, 15), ymd(2025, 5, 20)])
            .unwrap();
    assert_eq!(written, path);

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + records.len());
    assert!(lines[1].contains("\"=\"\"2330\"\"\""));
    assert!(lines[1].contains("近六日三次注意；昨日第一至第三款"));
    assert!(lines[2].contains("\"=\"\"5274\"\"\""));
}
