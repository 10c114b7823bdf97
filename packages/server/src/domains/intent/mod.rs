//! Natural-language query router.
//!
//! Resolves a visitor's free-text question to a page on the site, calling the
//! external oracle only when the caches and year rules cannot answer.

pub mod compose;
pub mod duplicate_cache;
pub mod intent_cache;
pub mod models;
pub mod name_index;
pub mod oracle_client;
pub mod prompt;
pub mod router;
pub mod settings;
pub mod suggestions;
pub mod year;

pub use compose::Composer;
pub use duplicate_cache::DuplicateCache;
pub use intent_cache::{load_static_table, IntentCache, YEAR_PLACEHOLDER};
pub use models::{
    ComposedUrl, OracleError, OracleResponse, Query, Resolution, ResolutionSource,
    CONTACT_ANCHOR, SEARCH_PARTICIPANTS,
};
pub use name_index::NameIndex;
pub use oracle_client::{parse_oracle_response, OracleClient, Throttle};
pub use prompt::render_prompt;
pub use router::IntentRouter;
pub use settings::{RouterSettings, SiteLayout};
pub use suggestions::SuggestionEngine;
pub use year::{decide_year, extract_year, YearDecision};
