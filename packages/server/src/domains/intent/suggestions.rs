//! Typeahead over the name index.

use super::name_index::NameIndex;
use super::year::{ascii_digits, FOUR_DIGITS, TWO_DIGITS};

/// Most suggestions returned for one input.
pub const MAX_SUGGESTIONS: usize = 3;

/// Product token removed from inputs ("GBB2025 ROFU" is a search for ROFU).
const PRODUCT_TOKEN: &str = "GBB";

/// Weight of a substring match relative to a whole-string match.
const PARTIAL_WEIGHT: f64 = 0.9;

/// Drop year-like numbers and the product token, then trim and upper-case.
pub fn clean_input(input: &str) -> String {
    let mut text = ascii_digits(input);

    // Both are found on the untouched input, then removed everywhere
    let four = FOUR_DIGITS.find(&text).map(|m| m.as_str().to_string());
    let two = TWO_DIGITS.find(&text).map(|m| m.as_str().to_string());
    for year in [four, two].into_iter().flatten() {
        text = text.replace(&year, "");
    }

    text.trim().to_uppercase().replace(PRODUCT_TOKEN, "").trim().to_string()
}

/// Similarity of `query` and `candidate`, 0-100.
///
/// The better of a whole-string edit distance and the best same-length
/// window of the longer string, the latter slightly discounted.
pub fn similarity(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let full = strsim::normalized_levenshtein(query, candidate);
    let partial = best_window(query, candidate);
    100.0 * full.max(PARTIAL_WEIGHT * partial)
}

fn best_window(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.len() == long.len() {
        return 0.0;
    }

    let width = short.len();
    let short: String = short.into_iter().collect();
    long.windows(width)
        .map(|window| {
            let window: String = window.iter().collect();
            strsim::normalized_levenshtein(&short, &window)
        })
        .fold(0.0, f64::max)
}

pub struct SuggestionEngine {
    tokens: Vec<String>,
    cutoff: f64,
}

impl SuggestionEngine {
    pub fn new(index: &NameIndex, cutoff: f64) -> Self {
        Self {
            tokens: index.tokens().map(str::to_string).collect(),
            cutoff,
        }
    }

    /// Up to three index entries resembling `input`, best first.
    pub fn suggest(&self, input: &str) -> Vec<String> {
        self.suggest_with(input, &mut fastrand::Rng::new())
    }

    /// Like [`suggest`](Self::suggest) with a caller-provided tie breaker.
    pub fn suggest_with(&self, input: &str, rng: &mut fastrand::Rng) -> Vec<String> {
        let query = clean_input(input);
        if query.is_empty() {
            return Vec::new();
        }

        // Shuffled so equal scores do not always favor the same names
        let mut order: Vec<usize> = (0..self.tokens.len()).collect();
        rng.shuffle(&mut order);

        let mut scored: Vec<(f64, usize)> = order
            .into_iter()
            .map(|i| (similarity(&query, &self.tokens[i]), i))
            .filter(|(score, _)| *score >= self.cutoff)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, i)| self.tokens[i].clone())
            .collect()
    }
}
