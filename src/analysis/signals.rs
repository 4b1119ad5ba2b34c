//! Derived signals over the free-text remark column.
//!
//! The venues concatenate several regulatory clauses into one remark, so a
//! numeric pattern can match more than once; the extracted value is always
//! the numeric maximum across all matches, never the first or last hit.

use once_cell::sync::Lazy;
use regex::Regex;

static VOLUME_MULTIPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:放大|為|之)\s*([0-9]+(?:\.[0-9]+)?)\s*倍").unwrap());
static GAIN_PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"漲幅(?:達)?\s*([0-9]+(?:\.[0-9]+)?)%").unwrap());

/// Literal substrings marking the first-clause / cumulative-gain regulatory
/// basis. Containment test, not a regex; both numeral forms are listed.
const FIRST_CLAUSE_LITERALS: [&str; 3] = ["第一款", "第1款", "累積收盤價漲幅"];

/// Clauses 1 through 3, each in ordinal-word and Arabic-numeral form.
const CLAUSES_1_TO_3: [&str; 6] = ["第一款", "第二款", "第三款", "第1款", "第2款", "第3款"];
const CLAUSE_10: [&str; 2] = ["第十款", "第10款"];

/// Everything the rule engine needs from one remark. Derived once per row,
/// never stored back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub volume_multiple: Option<f64>,
    pub gain_percent: Option<f64>,
    pub first_clause: bool,
    pub clause_1_to_3: bool,
    pub clause_10: bool,
}

impl Signals {
    pub fn derive(remark: &str) -> Self {
        Signals {
            volume_multiple: extract_max(&VOLUME_MULTIPLE_RE, remark),
            gain_percent: extract_max(&GAIN_PERCENT_RE, remark),
            first_clause: FIRST_CLAUSE_LITERALS
                .iter()
                .any(|literal| remark.contains(literal)),
            clause_1_to_3: has_clause(remark, &CLAUSES_1_TO_3),
            clause_10: has_clause(remark, &CLAUSE_10),
        }
    }
}

/// True if any member substring of the clause class occurs in `text`.
pub fn has_clause(text: &str, class: &[&str]) -> bool {
    class.iter().any(|member| text.contains(member))
}

pub fn has_clause_1_to_3(text: &str) -> bool {
    has_clause(text, &CLAUSES_1_TO_3)
}

pub fn has_clause_10(text: &str) -> bool {
    has_clause(text, &CLAUSE_10)
}

/// All non-overlapping matches mapped to numbers, reduced by maximum.
fn extract_max(pattern: &Regex, text: &str) -> Option<f64> {
    numeric_max(
        pattern
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .filter_map(|m| m.as_str().parse::<f64>().ok()),
    )
}

pub(crate) fn numeric_max(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values
        .into_iter()
        .fold(None, |best, value| Some(best.map_or(value, |b: f64| b.max(value))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_multiple_takes_the_numeric_maximum() {
        let remark = "本日成交量較六十日均量放大3倍，另本日成交量為5.5倍";
        assert_eq!(Signals::derive(remark).volume_multiple, Some(5.5));

        // Larger match first, smaller match last: still the maximum.
        let reversed = "成交量放大5.5倍，惟換手率之3倍";
        assert_eq!(Signals::derive(reversed).volume_multiple, Some(5.5));
    }

    #[test]
    fn gain_percent_accepts_optional_qualifier() {
        assert_eq!(Signals::derive("本日收盤價漲幅達6.52%").gain_percent, Some(6.52));
        assert_eq!(Signals::derive("累積收盤價漲幅 25%").gain_percent, Some(25.0));
        assert_eq!(
            Signals::derive("漲幅達8.1%，累積漲幅32.5%").gain_percent,
            Some(32.5)
        );
    }

    #[test]
    fn absent_patterns_yield_none() {
        let signals = Signals::derive("本日週轉率與同類股不相當");
        assert_eq!(signals.volume_multiple, None);
        assert_eq!(signals.gain_percent, None);
    }

    #[test]
    fn first_clause_is_a_literal_containment_test() {
        assert!(Signals::derive("第一款 本日漲幅異常").first_clause);
        assert!(Signals::derive("第1款").first_clause);
        assert!(Signals::derive("最近六日累積收盤價漲幅異常").first_clause);
        assert!(!Signals::derive("第十款").first_clause);
    }

    #[test]
    fn clause_classes_match_both_numeral_forms() {
        assert!(has_clause_1_to_3("符合第一款"));
        assert!(has_clause_1_to_3("符合第1款"));
        assert!(has_clause_1_to_3("符合第二款及第十款"));
        assert!(!has_clause_1_to_3("僅第十款"));
        assert!(!has_clause_1_to_3("僅第10款"));

        assert!(has_clause_10("僅第十款"));
        assert!(has_clause_10("僅第10款"));
        assert!(!has_clause_10("第一款"));
    }

    #[test]
    fn clause_predicates_are_independent() {
        let both = "第二款及第十款";
        assert!(has_clause_1_to_3(both));
        assert!(has_clause_10(both));
    }

    #[test]
    fn numeric_max_handles_empty_input() {
        assert_eq!(numeric_max([]), None);
        assert_eq!(numeric_max([3.0, 5.5, 4.2]), Some(5.5));
    }
}
