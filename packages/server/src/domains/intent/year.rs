//! Season inference from free text.
//!
//! A 4-digit number wins; otherwise a 2-digit number `n` is read as `2000 + n`
//! ("24年" means 2024). Full-width digits count as digits.

use lazy_static::lazy_static;
use regex::Regex;

use super::settings::SiteLayout;

lazy_static! {
    pub(crate) static ref FOUR_DIGITS: Regex = Regex::new(r"[0-9]{4}").unwrap();
    pub(crate) static ref TWO_DIGITS: Regex = Regex::new(r"[0-9]{2}").unwrap();
}

/// Map full-width digits (０-９) to ASCII, leave everything else alone.
pub fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect()
}

/// First year-like number in the text, if any.
pub fn extract_year(question: &str) -> Option<i32> {
    let text = ascii_digits(question);

    if let Some(m) = FOUR_DIGITS.find(&text) {
        return m.as_str().parse().ok();
    }

    TWO_DIGITS
        .find(&text)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .map(|n| 2000 + n)
}

/// What the year stage decided for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearDecision {
    /// Keep the contextual year.
    Keep,
    /// The question names another supported season; use it everywhere downstream.
    Override(i32),
    /// The question names the excluded season; answer with this path and stop.
    ShortCircuit(String),
}

type YearPredicate = fn(extracted: i32, contextual: i32, layout: &SiteLayout) -> bool;
type YearTransform = fn(extracted: i32, layout: &SiteLayout) -> YearDecision;

fn is_excluded(extracted: i32, _contextual: i32, layout: &SiteLayout) -> bool {
    extracted == layout.excluded_year
}

fn to_excluded_landing(_extracted: i32, layout: &SiteLayout) -> YearDecision {
    YearDecision::ShortCircuit(layout.excluded_landing_path())
}

fn is_other_supported(extracted: i32, contextual: i32, layout: &SiteLayout) -> bool {
    extracted != contextual && layout.is_available(extracted)
}

fn to_override(extracted: i32, _layout: &SiteLayout) -> YearDecision {
    YearDecision::Override(extracted)
}

/// Ordered; the first matching rule decides. Unmatched years are ignored.
const YEAR_RULES: &[(&str, YearPredicate, YearTransform)] = &[
    ("excluded season", is_excluded, to_excluded_landing),
    ("other supported season", is_other_supported, to_override),
];

/// Apply the year rules to a question asked from season `contextual`.
pub fn decide_year(question: &str, contextual: i32, layout: &SiteLayout) -> YearDecision {
    let Some(extracted) = extract_year(question) else {
        return YearDecision::Keep;
    };

    for (name, applies, transform) in YEAR_RULES {
        if applies(extracted, contextual, layout) {
            tracing::debug!(rule = name, extracted, contextual, "Year rule matched");
            return transform(extracted, layout);
        }
    }

    YearDecision::Keep
}
