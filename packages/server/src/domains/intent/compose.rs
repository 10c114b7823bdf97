//! Turns an oracle answer into a site-relative navigation target.
//!
//! Total: every input produces a [`ComposedUrl`]. Shapes the site does not
//! know degrade to whatever path the oracle named, without query parameters.

use lazy_static::lazy_static;
use regex::Regex;
use wana_kana::ConvertJapanese;

use super::models::{ComposedUrl, OracleResponse, CONTACT_ANCHOR, SEARCH_PARTICIPANTS};
use super::settings::SiteLayout;

lazy_static! {
    // Latin letters, digits, space and the symbols seen in stage names.
    // "Ω" admits "SOUND OF SONY Ω".
    static ref LATIN_NAME: Regex =
        Regex::new(r##"^[a-zA-Z0-9 \-!@#$%^&*()_+=~`<>?,./;:'"\\|{}\[\]Ω]+$"##).unwrap();
}

/// Sentinel the oracle writes for "no value".
const NONE_SENTINEL: &str = "None";

/// An auxiliary page whose answer moved to a season page.
struct LegacyPage {
    from: &'static str,
    /// Parameters that select the moved content; `None` is "no parameter".
    parameters: &'static [Option<&'static str>],
    /// File name under `/<year>/`.
    to: &'static str,
}

const LEGACY_PAGES: &[LegacyPage] = &[LegacyPage {
    from: "/others/7tosmoke",
    parameters: &[None, Some("latest_info")],
    to: "top_7tosmoke",
}];

/// Answer being rewritten by the override rules.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Draft {
    path: String,
    parameter: Option<String>,
    name: Option<String>,
}

type OverridePredicate = fn(&Draft) -> bool;
type OverrideTransform = fn(Draft, i32) -> Draft;

fn is_bare_landing(draft: &Draft) -> bool {
    draft.parameter.is_none() && draft.path.rsplit('/').next() == Some("top")
}

fn to_contact(mut draft: Draft, _year: i32) -> Draft {
    draft.parameter = Some(CONTACT_ANCHOR.to_string());
    draft
}

fn legacy_page(draft: &Draft) -> Option<&'static LegacyPage> {
    LEGACY_PAGES.iter().find(|page| {
        draft.path == page.from
            && page
                .parameters
                .iter()
                .any(|p| *p == draft.parameter.as_deref())
    })
}

fn is_legacy(draft: &Draft) -> bool {
    legacy_page(draft).is_some()
}

fn to_season_page(mut draft: Draft, year: i32) -> Draft {
    if let Some(page) = legacy_page(&draft) {
        draft.path = format!("/{}/{}", year, page.to);
    }
    draft
}

/// Ordered; every matching rule applies.
const OVERRIDE_RULES: &[(&str, OverridePredicate, OverrideTransform)] = &[
    ("landing page defaults to contact", is_bare_landing, to_contact),
    ("legacy auxiliary page", is_legacy, to_season_page),
];

/// Phonetic Latin spelling of a Japanese name.
///
/// Kana is converted directly; kanji (alone or mixed with kana) goes through
/// a dictionary reading. Characters with no reading pass through unchanged.
pub fn transliterate(name: &str) -> String {
    let romaji = name.to_romaji();
    if LATIN_NAME.is_match(&romaji) {
        return romaji;
    }
    kakasi::convert(name).romaji
}

/// Search value for a participant name.
///
/// Latin names are upper-cased. Anything else is transliterated; if that
/// still is not Latin, the name is used as given.
pub fn search_value(name: &str) -> String {
    if LATIN_NAME.is_match(name) {
        return name.to_uppercase();
    }

    let romaji = transliterate(name);
    if LATIN_NAME.is_match(&romaji) {
        return romaji.to_uppercase();
    }

    tracing::debug!(name, romaji = %romaji, "Name could not be transliterated, using as given");
    name.to_string()
}

pub struct Composer {
    layout: SiteLayout,
}

impl Composer {
    pub fn new(layout: SiteLayout) -> Self {
        Self { layout }
    }

    /// Compose the target for an answer given in the context of season `year`.
    pub fn compose(&self, year: i32, response: &OracleResponse) -> ComposedUrl {
        let path = self.strip_origin(&response.url);
        let path = self.canonical_others(path);
        let path = clean_path(&path);

        let mut draft = Draft {
            path,
            parameter: present(response.parameter.as_deref()),
            name: present(response.name.as_deref()),
        };

        for (rule, applies, transform) in OVERRIDE_RULES {
            if applies(&draft) {
                tracing::debug!(rule, path = %draft.path, "Override rule applied");
                draft = transform(draft, year);
            }
        }

        let mut url = ComposedUrl::new(draft.path);
        match draft.parameter.as_deref() {
            Some(SEARCH_PARTICIPANTS) => {
                url = url.with_param("scroll", SEARCH_PARTICIPANTS);
                if let Some(name) = draft.name.as_deref() {
                    url = url.with_param("value", search_value(name));
                }
            }
            Some(parameter) => url = url.with_param("scroll", parameter),
            None => {}
        }
        url
    }

    /// Drop the site's own origin (or any absolute origin) from `url`.
    fn strip_origin(&self, url: &str) -> String {
        let url = url.trim();
        let origin = self.layout.site_origin.trim_end_matches('/');
        let host = self.layout.origin_host();

        let path = if let Some(rest) = url.strip_prefix(origin) {
            rest
        } else if let Some((_, after_scheme)) = url.split_once("://") {
            after_scheme
                .find('/')
                .map(|i| &after_scheme[i..])
                .unwrap_or("")
        } else if !host.is_empty() && url.starts_with(host) {
            &url[host.len()..]
        } else {
            url
        };

        if host.is_empty() {
            path.to_string()
        } else {
            path.replace(host, "")
        }
    }

    fn canonical_others(&self, path: String) -> String {
        self.layout
            .others_slugs
            .iter()
            .find(|slug| !slug.is_empty() && path.contains(slug.as_str()))
            .map(|slug| format!("/others/{}", slug))
            .unwrap_or(path)
    }
}

/// Keep the part before any percent-encoded suffix, query or fragment, with
/// exactly one leading slash and no trailing one.
fn clean_path(path: &str) -> String {
    let path = path
        .split('%')
        .next()
        .unwrap_or("")
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim();
    let path = path.trim_matches('/');
    format!("/{}", path)
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != NONE_SENTINEL)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> Composer {
        Composer::new(SiteLayout::default())
    }

    fn answer(url: &str, parameter: &str, name: &str) -> OracleResponse {
        OracleResponse {
            url: url.to_string(),
            parameter: Some(parameter.to_string()),
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_schedule_with_scroll() {
        let url = composer().compose(
            2024,
            &answer("https://gbbinfo-jpn.onrender.com/2024/time_schedule", "7tosmoke", "None"),
        );
        assert_eq!(url.to_string(), "/2024/time_schedule?scroll=7tosmoke");
    }

    #[test]
    fn test_origin_never_survives() {
        let composer = composer();
        let urls = [
            "https://gbbinfo-jpn.onrender.com/2025/rule",
            "http://gbbinfo-jpn.onrender.com/2025/rule",
            "gbbinfo-jpn.onrender.com/2025/rule",
            "/2025/gbbinfo-jpn.onrender.com/rule",
            "https://gbbinfo-jpn.onrender.com",
        ];
        for raw in urls {
            let url = composer.compose(2025, &answer(raw, "None", "None"));
            assert!(!url.to_string().contains("gbbinfo-jpn.onrender.com"), "{}", raw);
            assert!(url.path.starts_with('/'), "{}", raw);
        }
    }

    #[test]
    fn test_others_slug_is_canonicalized() {
        let url = composer().compose(
            2025,
            &answer("https://gbbinfo-jpn.onrender.com/2025/how_to_plan", "hotel", "None"),
        );
        assert_eq!(url.to_string(), "/others/how_to_plan?scroll=hotel");
    }

    #[test]
    fn test_percent_suffix_is_truncated() {
        let url = composer().compose(
            2025,
            &answer("/2025/rule%E5%AF%A9%E6%9F%BB%E5%93%A1", "judges", "None"),
        );
        assert_eq!(url.to_string(), "/2025/rule?scroll=judges");
    }

    #[test]
    fn test_bare_landing_gets_contact() {
        let url = composer().compose(2025, &answer("/2025/top", "None", "None"));
        assert_eq!(url.to_string(), "/2025/top?scroll=contact");

        let url = composer().compose(2025, &answer("/2025/top", "date", "None"));
        assert_eq!(url.to_string(), "/2025/top?scroll=date");
    }

    #[test]
    fn test_legacy_7tosmoke_moves_to_season_page() {
        let composer = composer();

        let url = composer.compose(2025, &answer("/others/7tosmoke", "None", "None"));
        assert_eq!(url.to_string(), "/2025/top_7tosmoke");

        let url = composer.compose(2025, &answer("/others/7tosmoke", "latest_info", "None"));
        assert_eq!(url.to_string(), "/2025/top_7tosmoke?scroll=latest_info");

        let url = composer.compose(2025, &answer("/others/7tosmoke", "main_event_rules", "None"));
        assert_eq!(url.to_string(), "/others/7tosmoke?scroll=main_event_rules");
    }

    #[test]
    fn test_search_latin_name_is_upper_cased() {
        let url = composer().compose(
            2025,
            &answer("/2025/participants", SEARCH_PARTICIPANTS, "Sound of Sony Ω"),
        );
        assert_eq!(url.param("scroll"), Some(SEARCH_PARTICIPANTS));
        assert_eq!(url.param("value"), Some("SOUND OF SONY Ω"));
    }

    #[test]
    fn test_search_kana_name_is_transliterated() {
        let url = composer().compose(
            2025,
            &answer("/2025/participants", SEARCH_PARTICIPANTS, "ろふ"),
        );
        assert_eq!(url.param("value"), Some("ROFU"));
    }

    #[test]
    fn test_search_kanji_name_is_transliterated() {
        for name in ["翼", "大翔", "ロフ太郎"] {
            let url = composer().compose(
                2025,
                &answer("/2025/participants", SEARCH_PARTICIPANTS, name),
            );
            let value = url.param("value").unwrap();
            assert!(LATIN_NAME.is_match(value), "{} -> {}", name, value);
            assert_eq!(value, value.to_uppercase());
        }

        assert!(search_value("ロフ太郎").starts_with("ROFU"));
    }

    #[test]
    fn test_transliterate_kana_and_kanji() {
        assert_eq!(transliterate("ろふ"), "rofu");
        assert!(LATIN_NAME.is_match(&transliterate("大翔")));
        assert!(LATIN_NAME.is_match(&transliterate("ロフ太郎")));
    }

    #[test]
    fn test_search_untransliterable_name_is_kept() {
        let url = composer().compose(
            2025,
            &answer("/2025/participants", SEARCH_PARTICIPANTS, "🎤"),
        );
        assert_eq!(url.param("value"), Some("🎤"));
    }

    #[test]
    fn test_search_without_name_keeps_scroll() {
        let url = composer().compose(
            2025,
            &answer("/2025/participants", SEARCH_PARTICIPANTS, "None"),
        );
        assert_eq!(url.to_string(), "/2025/participants?scroll=search_participants");
    }

    #[test]
    fn test_unknown_shape_degrades() {
        let url = composer().compose(
            2025,
            &OracleResponse {
                url: String::new(),
                parameter: None,
                name: None,
            },
        );
        assert_eq!(url.to_string(), "/");
    }
}
