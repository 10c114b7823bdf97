//! Exact-match answers that never need the oracle.
//!
//! Keys are normalized questions; values are URL templates in which
//! `__year__` stands for the season being asked about. Seeded once at startup
//! from the static question table and the name index, read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use super::models::{ComposedUrl, SEARCH_PARTICIPANTS};
use super::name_index::{normalize_key, NameIndex};

/// Stands for the resolved season inside a template.
pub const YEAR_PLACEHOLDER: &str = "__year__";

lazy_static! {
    // A literal season in a path segment, e.g. "/2024/rule"
    static ref EMBEDDED_YEAR: Regex = Regex::new(r"(^|/)[0-9]{4}(/|$|\?)").unwrap();
}

/// Read the static `{question: template}` table.
pub fn load_static_table(path: &Path) -> Result<IndexMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read intent cache table {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Intent cache table {} is not a JSON object of strings", path.display()))
}

/// Template for a participant name search.
pub fn participant_search_template(name: &str) -> String {
    ComposedUrl::new(format!("/{}/participants", YEAR_PLACEHOLDER))
        .with_param("scroll", SEARCH_PARTICIPANTS)
        .with_param("value", name)
        .to_string()
}

#[derive(Debug, Clone, Default)]
pub struct IntentCache {
    entries: HashMap<String, String>,
}

impl IntentCache {
    /// Build from the static table and the participant names of `index`.
    ///
    /// Key collisions are data defects: they are logged and the later entry
    /// (participant names come last) wins. Templates that hard-code a season
    /// instead of using the placeholder are rejected.
    pub fn seed<'a>(
        static_table: impl IntoIterator<Item = (&'a str, &'a str)>,
        index: &NameIndex,
    ) -> Self {
        let mut cache = Self::default();

        for (question, template) in static_table {
            if EMBEDDED_YEAR.is_match(template) {
                tracing::warn!(
                    question,
                    template,
                    "Static intent template embeds a season; use {} instead",
                    YEAR_PLACEHOLDER
                );
                continue;
            }
            cache.insert(question, template.to_string());
        }

        for name in index.participant_names() {
            cache.insert(name, participant_search_template(name));
        }

        tracing::info!(entries = cache.len(), "Intent cache seeded");
        cache
    }

    fn insert(&mut self, question: &str, template: String) {
        let key = normalize_key(question);
        if key.is_empty() {
            return;
        }
        if let Some(previous) = self.entries.insert(key.clone(), template) {
            tracing::warn!(
                key = %key,
                previous = %previous,
                "Duplicate intent cache key after normalization"
            );
        }
    }

    /// Template for a question, compared case- and whitespace-insensitively.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        self.entries.get(&normalize_key(question)).map(String::as_str)
    }

    /// Lookup and substitute `year` into the template.
    pub fn resolve(&self, question: &str, year: i32) -> Option<ComposedUrl> {
        self.lookup(question)
            .map(|template| ComposedUrl::parse(&template.replace(YEAR_PLACEHOLDER, &year.to_string())))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
