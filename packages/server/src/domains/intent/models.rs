use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Scroll parameter that turns a participants page into a name search.
pub const SEARCH_PARTICIPANTS: &str = "search_participants";

/// Anchor used when a landing page is chosen without one.
pub const CONTACT_ANCHOR: &str = "contact";

/// A visitor question in the context of the season page they asked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub year: i32,
    pub raw_text: String,
}

impl Query {
    pub fn new(year: i32, raw_text: impl Into<String>) -> Self {
        Self {
            year,
            raw_text: raw_text.into(),
        }
    }

    /// Same question, different season context.
    pub fn with_year(&self, year: i32) -> Self {
        Self {
            year,
            raw_text: self.raw_text.clone(),
        }
    }
}

/// The answer shape the oracle must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleResponse {
    pub url: String,
    pub parameter: Option<String>,
    pub name: Option<String>,
}

impl OracleResponse {
    /// Safe answer when the oracle cannot be reached: the season landing
    /// page, scrolled to the contact section.
    pub fn fallback(landing_path: impl Into<String>) -> Self {
        Self {
            url: landing_path.into(),
            parameter: Some(CONTACT_ANCHOR.to_string()),
            name: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle contract violation: {0}")]
    ContractViolation(String),

    #[error("oracle failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<OracleError>,
    },
}

/// Final navigation target: a site-relative path plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposedUrl {
    pub path: String,
    pub query: IndexMap<String, String>,
}

impl ComposedUrl {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: IndexMap::new(),
        }
    }

    /// Append (or replace) a query parameter, keeping insertion order.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Parse `path?k=v&k2=v2`. Values are percent-decoded; pairs without `=`
    /// get an empty value. Never fails.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, query),
            None => (raw, ""),
        };

        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(key), decode(value))
            })
            .collect();

        Self {
            path: path.to_string(),
            query,
        }
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

impl fmt::Display for ComposedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{}{}={}",
                sep,
                urlencoding::encode(key),
                urlencoding::encode(value)
            )?;
        }
        Ok(())
    }
}

impl Serialize for ComposedUrl {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which stage produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    DuplicateCache,
    IntentCache,
    ExcludedYear,
    Oracle,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: ComposedUrl,
    /// Season the answer was resolved for (after any override).
    pub year: i32,
    pub source: ResolutionSource,
}
