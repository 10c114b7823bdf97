use std::time::Duration;

/// Static facts about the site the router navigates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    /// Origin the oracle is told the site lives at; stripped from its answers.
    pub site_origin: String,
    /// Seasons with pages on the site.
    pub available_years: Vec<i32>,
    /// Season with no event; every question about it lands on its top page.
    pub excluded_year: i32,
    /// Pages served under `/others/<slug>`, matched in order.
    pub others_slugs: Vec<String>,
}

impl SiteLayout {
    pub fn is_available(&self, year: i32) -> bool {
        self.available_years.contains(&year)
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.available_years.iter().copied().max()
    }

    /// The `n` most recent available seasons, newest first.
    pub fn recent_years(&self, n: usize) -> Vec<i32> {
        let mut years = self.available_years.clone();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        years.truncate(n);
        years
    }

    /// `/<year>/top`
    pub fn landing_path(&self, year: i32) -> String {
        format!("/{}/top", year)
    }

    pub fn excluded_landing_path(&self) -> String {
        self.landing_path(self.excluded_year)
    }

    /// Host part of `site_origin` (no scheme, no trailing slash).
    pub fn origin_host(&self) -> &str {
        let origin = self.site_origin.trim_end_matches('/');
        origin
            .split_once("://")
            .map(|(_, host)| host)
            .unwrap_or(origin)
    }
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            site_origin: "https://gbbinfo-jpn.onrender.com".to_string(),
            available_years: (2017..=2025).collect(),
            excluded_year: 2022,
            others_slugs: vec![
                "about".to_string(),
                "how_to_plan".to_string(),
                "7tosmoke".to_string(),
            ],
        }
    }
}

/// Router tunables. Defaults match production.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterSettings {
    /// Minimum spacing between two oracle calls, across all callers.
    pub oracle_interval: Duration,
    pub oracle_max_attempts: u32,
    pub oracle_retry_delay: Duration,
    pub oracle_attempt_timeout: Duration,
    pub duplicate_ttl: Duration,
    pub duplicate_capacity: usize,
    /// Minimum suggestion score, 0-100.
    pub suggestion_cutoff: f64,
    /// Upper bound on one whole resolution, applied by the HTTP layer.
    pub resolve_timeout: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            oracle_interval: Duration::from_secs(2),
            oracle_max_attempts: 5,
            oracle_retry_delay: Duration::from_secs(2),
            oracle_attempt_timeout: Duration::from_secs(15),
            duplicate_ttl: Duration::from_secs(60),
            duplicate_capacity: 100,
            suggestion_cutoff: 40.0,
            resolve_timeout: Duration::from_secs(60),
        }
    }
}
