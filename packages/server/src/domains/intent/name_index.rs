//! Vocabulary of everything a visitor might type as a whole question:
//! the static question keys plus every recent performer, team and member name.
//!
//! Built once at startup and never mutated.

use std::collections::BTreeSet;
use std::path::Path;

use crate::domains::participants::{load_season, DatasetError, ParticipantRow};

/// Upper-cased, trimmed form used for every key comparison.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_uppercase()
}

#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    participant_names: BTreeSet<String>,
    tokens: BTreeSet<String>,
}

impl NameIndex {
    /// Collect names from dataset rows and merge them with the static keys.
    ///
    /// Names starting with `?` are unannounced slots and are skipped.
    pub fn build<'a>(
        static_keys: impl IntoIterator<Item = &'a str>,
        rows: &[ParticipantRow],
    ) -> Self {
        let mut participant_names = BTreeSet::new();

        for row in rows {
            let names = std::iter::once(row.name()).chain(row.member_names());
            for name in names {
                let key = normalize_key(name);
                if key.is_empty() || key.starts_with('?') {
                    continue;
                }
                participant_names.insert(key);
            }
        }

        let mut tokens: BTreeSet<String> = static_keys
            .into_iter()
            .map(normalize_key)
            .filter(|k| !k.is_empty())
            .collect();
        tokens.extend(participant_names.iter().cloned());

        Self {
            participant_names,
            tokens,
        }
    }

    /// Load the given seasons from `<dir>/<year>.csv` and build the index.
    pub fn load<'a>(
        static_keys: impl IntoIterator<Item = &'a str>,
        dir: &Path,
        years: &[i32],
    ) -> Result<Self, DatasetError> {
        let mut rows = Vec::new();
        for &year in years {
            rows.extend(load_season(dir, year)?);
        }

        let index = Self::build(static_keys, &rows);
        tracing::info!(
            seasons = ?years,
            participant_names = index.participant_names.len(),
            tokens = index.tokens.len(),
            "Name index built"
        );
        Ok(index)
    }

    /// Normalized performer, team and member names.
    pub fn participant_names(&self) -> impl Iterator<Item = &str> {
        self.participant_names.iter().map(String::as_str)
    }

    /// Full suggestion vocabulary.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
