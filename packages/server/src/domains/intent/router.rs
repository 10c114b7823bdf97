//! The query router: free text in, navigation target out.
//!
//! Stages run in this order for every question:
//!
//! 1. duplicate cache, keyed on the raw text
//! 2. year rules (the excluded season short-circuits, another season overrides)
//! 3. intent cache, with the effective season substituted
//! 4. oracle, then composition; the fallback answer if the oracle gave up
//!
//! Identical questions arriving while the oracle is still working on the
//! first one wait for that answer instead of asking again.
//!
//! [`IntentRouter::resolve`] has no error path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use super::compose::Composer;
use super::duplicate_cache::DuplicateCache;
use super::intent_cache::IntentCache;
use super::models::{ComposedUrl, OracleResponse, Query, Resolution, ResolutionSource};
use super::name_index::NameIndex;
use super::oracle_client::OracleClient;
use super::settings::{RouterSettings, SiteLayout};
use super::suggestions::SuggestionEngine;
use super::year::{decide_year, YearDecision};
use crate::kernel::{AuditRecorder, ServerDeps};

/// Outcome of one oracle stage, shared with identical concurrent questions.
type InFlight = Arc<OnceCell<(ComposedUrl, ResolutionSource)>>;

pub struct IntentRouter {
    layout: SiteLayout,
    settings: RouterSettings,
    intent_cache: IntentCache,
    duplicates: DuplicateCache,
    in_flight: Mutex<HashMap<String, InFlight>>,
    oracle: OracleClient,
    composer: Composer,
    suggestions: SuggestionEngine,
    index_tokens: usize,
    audit: AuditRecorder,
}

impl IntentRouter {
    pub fn new(
        layout: SiteLayout,
        settings: RouterSettings,
        intent_cache: IntentCache,
        index: &NameIndex,
        deps: ServerDeps,
    ) -> Self {
        Self {
            duplicates: DuplicateCache::new(settings.duplicate_capacity, settings.duplicate_ttl),
            in_flight: Mutex::new(HashMap::new()),
            oracle: OracleClient::new(deps.oracle, layout.site_origin.clone(), &settings),
            composer: Composer::new(layout.clone()),
            suggestions: SuggestionEngine::new(index, settings.suggestion_cutoff),
            index_tokens: index.len(),
            audit: deps.audit,
            intent_cache,
            layout,
            settings,
        }
    }

    /// Resolve a question asked from the page of season `path_year`.
    ///
    /// The excluded season has no search page of its own and always lands on
    /// its top page; a season the site does not know is treated as the latest.
    pub async fn resolve_from_page(&self, path_year: i32, question: &str) -> Resolution {
        if path_year == self.layout.excluded_year {
            return Resolution {
                url: ComposedUrl::new(self.layout.excluded_landing_path()),
                year: path_year,
                source: ResolutionSource::ExcludedYear,
            };
        }

        self.resolve(&Query::new(self.contextual_year(path_year), question))
            .await
    }

    /// Season used as context for a page year.
    pub fn contextual_year(&self, path_year: i32) -> i32 {
        if self.layout.is_available(path_year) {
            return path_year;
        }
        let latest = self.layout.latest_year().unwrap_or(path_year);
        tracing::debug!(path_year, latest, "Unsupported season, using latest");
        latest
    }

    pub async fn resolve(&self, query: &Query) -> Resolution {
        if let Some(url) = self.duplicates.get(&query.raw_text) {
            tracing::info!(question = %query.raw_text, url = %url, "Duplicate question");
            return Resolution {
                url,
                year: query.year,
                source: ResolutionSource::DuplicateCache,
            };
        }

        let query = match decide_year(&query.raw_text, query.year, &self.layout) {
            YearDecision::ShortCircuit(path) => {
                tracing::info!(question = %query.raw_text, url = %path, "Excluded season asked");
                return Resolution {
                    url: ComposedUrl::parse(&path),
                    year: self.layout.excluded_year,
                    source: ResolutionSource::ExcludedYear,
                };
            }
            YearDecision::Override(year) => {
                tracing::info!(from = query.year, to = year, "Season taken from question");
                query.with_year(year)
            }
            YearDecision::Keep => query.clone(),
        };

        if let Some(url) = self.intent_cache.resolve(&query.raw_text, query.year) {
            tracing::info!(question = %query.raw_text, url = %url, "Intent cache hit");
            return self.finish(&query, url, ResolutionSource::IntentCache);
        }

        let cell = self.join_in_flight(&query.raw_text);
        let mut asked = false;
        let (url, source) = cell
            .get_or_init(|| {
                asked = true;
                self.ask_oracle(&query)
            })
            .await
            .clone();
        self.leave_in_flight(&query.raw_text, &cell);

        if !asked {
            tracing::info!(question = %query.raw_text, url = %url, "Joined in-flight question");
            return Resolution {
                url,
                year: query.year,
                source: ResolutionSource::DuplicateCache,
            };
        }
        self.finish(&query, url, source)
    }

    async fn ask_oracle(&self, query: &Query) -> (ComposedUrl, ResolutionSource) {
        match self.oracle.ask(query.year, &query.raw_text).await {
            Ok(response) => {
                let url = self.composer.compose(query.year, &response);
                self.duplicates.put(query.raw_text.clone(), url.clone());
                tracing::info!(question = %query.raw_text, year = query.year, url = %url, "Oracle resolved question");
                (url, ResolutionSource::Oracle)
            }
            Err(e) => {
                tracing::error!(question = %query.raw_text, error = %e, "Oracle unavailable, using fallback");
                (self.fallback_url(query.year), ResolutionSource::Fallback)
            }
        }
    }

    fn join_in_flight(&self, question: &str) -> InFlight {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.entry(question.to_string()).or_default().clone()
    }

    fn leave_in_flight(&self, question: &str, cell: &InFlight) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if in_flight.get(question).is_some_and(|c| Arc::ptr_eq(c, cell)) {
            in_flight.remove(question);
        }
    }

    /// Answer for a question whose resolution ran out of time.
    ///
    /// Applies the same season rules as [`resolve_from_page`](Self::resolve_from_page)
    /// and records the fallback like any other resolution.
    pub fn timed_out(&self, path_year: i32, question: &str) -> ComposedUrl {
        if path_year == self.layout.excluded_year {
            return ComposedUrl::new(self.layout.excluded_landing_path());
        }

        let query = Query::new(self.contextual_year(path_year), question);
        let query = match decide_year(&query.raw_text, query.year, &self.layout) {
            YearDecision::ShortCircuit(path) => return ComposedUrl::parse(&path),
            YearDecision::Override(year) => query.with_year(year),
            YearDecision::Keep => query,
        };

        let url = self.fallback_url(query.year);
        self.finish(&query, url, ResolutionSource::Fallback).url
    }

    /// Landing page of `year` scrolled to the contact section.
    pub fn fallback_url(&self, year: i32) -> ComposedUrl {
        self.composer
            .compose(year, &OracleResponse::fallback(self.layout.landing_path(year)))
    }

    /// Up to three names or questions resembling `input`.
    pub fn suggest(&self, input: &str) -> Vec<String> {
        self.suggestions.suggest(input)
    }

    fn finish(&self, query: &Query, url: ComposedUrl, source: ResolutionSource) -> Resolution {
        self.audit
            .record(query.year, &query.raw_text, &url.to_string());
        Resolution {
            url,
            year: query.year,
            source,
        }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn intent_entries(&self) -> usize {
        self.intent_cache.len()
    }

    pub fn index_tokens(&self) -> usize {
        self.index_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{MockOracle, TestDependencies};
    use std::time::Duration;

    fn router(oracle: MockOracle, table: &[(&str, &str)]) -> (std::sync::Arc<MockOracle>, IntentRouter) {
        let deps = TestDependencies::new().mock_oracle(oracle);
        let handle = deps.oracle.clone();
        let settings = RouterSettings {
            oracle_interval: Duration::from_millis(1),
            oracle_retry_delay: Duration::from_millis(1),
            ..RouterSettings::default()
        };
        let index = NameIndex::default();
        let cache = IntentCache::seed(table.iter().copied(), &index);
        let router = IntentRouter::new(
            SiteLayout::default(),
            settings,
            cache,
            &index,
            deps.into_server_deps(),
        );
        (handle, router)
    }

    #[tokio::test]
    async fn test_excluded_page_year_lands_on_its_top() {
        let (oracle, router) = router(MockOracle::new(), &[]);

        let resolution = router.resolve_from_page(2022, "チケット").await;

        assert_eq!(resolution.url.to_string(), "/2022/top");
        assert_eq!(resolution.source, ResolutionSource::ExcludedYear);
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_page_year_uses_latest() {
        let (_, router) = router(MockOracle::new(), &[("審査員", "/__year__/rule?scroll=judges")]);

        let resolution = router.resolve_from_page(2031, "審査員").await;

        assert_eq!(resolution.year, 2025);
        assert_eq!(resolution.url.to_string(), "/2025/rule?scroll=judges");
    }

    #[tokio::test]
    async fn test_fallback_url() {
        let (_, router) = router(MockOracle::new(), &[]);
        assert_eq!(router.fallback_url(2024).to_string(), "/2024/top?scroll=contact");
    }
}
