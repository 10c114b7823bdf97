//! Rate-limited, retrying access to the external oracle.
//!
//! One [`Throttle`] is shared by every caller of a client. Each attempt takes
//! a fresh slot from it, so retries are paced like first attempts.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use serde_json::Value;
use tokio::sync::Mutex;

use super::models::{OracleError, OracleResponse};
use super::prompt::render_prompt_for;
use super::settings::RouterSettings;
use crate::kernel::BaseOracle;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Global rate gate: at most one call per `interval`, callers released in
/// arrival order.
pub struct Throttle {
    limiter: DefaultRateLimiter,
    turn: Mutex<()>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
        Self {
            limiter: RateLimiter::direct(quota),
            turn: Mutex::new(()),
        }
    }

    /// Wait for the next slot.
    pub async fn acquire(&self) {
        // tokio's Mutex is fair, so waiters leave in the order they arrived
        let _turn = self.turn.lock().await;
        self.limiter.until_ready().await;
    }
}

pub struct OracleClient {
    oracle: Arc<dyn BaseOracle>,
    throttle: Throttle,
    site_origin: String,
    max_attempts: u32,
    retry_delay: Duration,
    attempt_timeout: Duration,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn BaseOracle>, site_origin: impl Into<String>, settings: &RouterSettings) -> Self {
        Self {
            oracle,
            throttle: Throttle::new(settings.oracle_interval),
            site_origin: site_origin.into(),
            max_attempts: settings.oracle_max_attempts.max(1),
            retry_delay: settings.oracle_retry_delay,
            attempt_timeout: settings.oracle_attempt_timeout,
        }
    }

    /// Ask which page answers `question` for season `year`.
    ///
    /// Fails only after every attempt failed; the caller substitutes a
    /// fallback answer.
    pub async fn ask(&self, year: i32, question: &str) -> Result<OracleResponse, OracleError> {
        let prompt = render_prompt_for(&self.site_origin, year, question);
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            self.throttle.acquire().await;

            match self.attempt(&prompt).await {
                Ok(response) => {
                    tracing::debug!(attempt, url = %response.url, "Oracle answered");
                    return Ok(response);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Oracle attempt failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(OracleError::Exhausted {
            attempts: self.max_attempts,
            last: Box::new(
                last_error.unwrap_or_else(|| OracleError::Transport("no attempt made".to_string())),
            ),
        })
    }

    async fn attempt(&self, prompt: &str) -> Result<OracleResponse, OracleError> {
        let text = tokio::time::timeout(self.attempt_timeout, self.oracle.generate_json(prompt))
            .await
            .map_err(|_| OracleError::Timeout(self.attempt_timeout))?
            .map_err(|e| OracleError::Transport(format!("{:#}", e)))?;

        parse_oracle_response(&text)
    }
}

/// Read the oracle's text as an [`OracleResponse`].
///
/// Accepts a fenced code block, Python-style single quotes and a list whose
/// first element is the answer. Anything else is a contract violation.
pub fn parse_oracle_response(text: &str) -> Result<OracleResponse, OracleError> {
    let body = strip_code_fence(text.trim());

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(strict) => serde_json::from_str::<Value>(&body.replace('\'', "\"")).map_err(|_| {
            OracleError::ContractViolation(format!("not JSON: {}", strict))
        })?,
    };

    let object = match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::ContractViolation("empty array".to_string()))?,
        other => other,
    };

    let Value::Object(mut fields) = object else {
        return Err(OracleError::ContractViolation("answer is not an object".to_string()));
    };

    let url = match fields.remove("url") {
        Some(Value::String(url)) => url,
        Some(_) => return Err(OracleError::ContractViolation("url is not a string".to_string())),
        None => return Err(OracleError::ContractViolation("missing url".to_string())),
    };

    Ok(OracleResponse {
        url,
        parameter: optional_string(&mut fields, "parameter")?,
        name: optional_string(&mut fields, "name")?,
    })
}

/// A key that must be present, holding a string or null.
fn optional_string(
    fields: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<String>, OracleError> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Null) => Ok(None),
        Some(_) => Err(OracleError::ContractViolation(format!("{} is not a string", key))),
        None => Err(OracleError::ContractViolation(format!("missing {}", key))),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string ("json") on the opening line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::MockOracle;
    use std::time::Instant;

    const SCHEDULE: &str = r#"{"url": "https://gbbinfo-jpn.onrender.com/2024/time_schedule", "parameter": "7tosmoke", "name": "None"}"#;

    fn fast_settings() -> RouterSettings {
        RouterSettings {
            oracle_interval: Duration::from_millis(1),
            oracle_retry_delay: Duration::from_millis(1),
            oracle_attempt_timeout: Duration::from_millis(200),
            ..RouterSettings::default()
        }
    }

    fn client(oracle: MockOracle, settings: &RouterSettings) -> (Arc<MockOracle>, OracleClient) {
        let oracle = Arc::new(oracle);
        let client = OracleClient::new(oracle.clone(), "https://gbbinfo-jpn.onrender.com", settings);
        (oracle, client)
    }

    #[test]
    fn test_parse_strict_json() {
        let response = tokio_test::assert_ok!(parse_oracle_response(SCHEDULE));
        assert_eq!(response.url, "https://gbbinfo-jpn.onrender.com/2024/time_schedule");
        assert_eq!(response.parameter.as_deref(), Some("7tosmoke"));
        assert_eq!(response.name.as_deref(), Some("None"));
    }

    #[test]
    fn test_parse_single_quotes() {
        let response =
            parse_oracle_response("{'url': '/2025/rule', 'parameter': 'judges', 'name': 'None'}")
                .unwrap();
        assert_eq!(response.url, "/2025/rule");
        assert_eq!(response.parameter.as_deref(), Some("judges"));
    }

    #[test]
    fn test_parse_keeps_apostrophes_in_valid_json() {
        let response = parse_oracle_response(
            r#"{"url": "/2025/participants", "parameter": "search_participants", "name": "River'"}"#,
        )
        .unwrap();
        assert_eq!(response.name.as_deref(), Some("River'"));
    }

    #[test]
    fn test_parse_array_takes_first() {
        let response = parse_oracle_response(&format!("[{}, {{\"url\": \"/x\"}}]", SCHEDULE)).unwrap();
        assert_eq!(response.parameter.as_deref(), Some("7tosmoke"));

        let err = tokio_test::assert_err!(parse_oracle_response("[]"));
        assert!(matches!(err, OracleError::ContractViolation(_)));
    }

    #[test]
    fn test_parse_code_fence_and_nulls() {
        let text = "```json\n{\"url\": \"/2025/top\", \"parameter\": null, \"name\": null}\n```";
        let response = parse_oracle_response(text).unwrap();
        assert_eq!(response.url, "/2025/top");
        assert!(response.parameter.is_none());
        assert!(response.name.is_none());
    }

    #[test]
    fn test_parse_rejects_contract_violations() {
        let cases = [
            "not json at all",
            r#"{"parameter": "x", "name": "None"}"#,
            r#"{"url": 3, "parameter": "x", "name": "None"}"#,
            r#"{"url": "/2025/top", "name": "None"}"#,
            r#"{"url": "/2025/top", "parameter": ["a"], "name": "None"}"#,
            r#""just a string""#,
        ];
        for case in cases {
            assert!(
                matches!(parse_oracle_response(case), Err(OracleError::ContractViolation(_))),
                "{}",
                case
            );
        }
    }

    #[tokio::test]
    async fn test_ask_retries_until_valid() {
        let settings = fast_settings();
        let (oracle, client) = client(
            MockOracle::new()
                .with_error("503 Service Unavailable")
                .with_response("I think the schedule page")
                .with_response(SCHEDULE),
            &settings,
        );

        let response = client.ask(2024, "24年のタイムスケジュール").await.unwrap();

        assert_eq!(response.parameter.as_deref(), Some("7tosmoke"));
        assert_eq!(oracle.call_count(), 3);
        assert!(oracle.was_called_with("「24年のタイムスケジュール」"));
    }

    #[tokio::test]
    async fn test_ask_gives_up_after_ceiling() {
        let settings = RouterSettings {
            oracle_max_attempts: 3,
            ..fast_settings()
        };
        let (oracle, client) = client(
            MockOracle::new()
                .with_error("boom")
                .with_error("boom")
                .with_error("boom")
                .with_response(SCHEDULE),
            &settings,
        );

        let err = client.ask(2024, "x").await.unwrap_err();

        assert!(matches!(err, OracleError::Exhausted { attempts: 3, .. }));
        assert_eq!(oracle.call_count(), 3);
    }

    #[tokio::test]
    async fn test_stalled_attempt_times_out_and_retries() {
        let settings = RouterSettings {
            oracle_attempt_timeout: Duration::from_millis(50),
            ..fast_settings()
        };
        let (oracle, client) = client(
            MockOracle::new()
                .with_stalled_response(Duration::from_secs(5), SCHEDULE)
                .with_response(SCHEDULE),
            &settings,
        );

        let started = Instant::now();
        let response = client.ask(2024, "x").await.unwrap();

        assert_eq!(response.url, "https://gbbinfo-jpn.onrender.com/2024/time_schedule");
        assert_eq!(oracle.call_count(), 2);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_throttle_spaces_calls() {
        let throttle = Throttle::new(Duration::from_millis(100));

        let started = Instant::now();
        for _ in 0..3 {
            throttle.acquire().await;
        }

        // first slot is free, the next two wait one interval each
        assert!(started.elapsed() >= Duration::from_millis(190));
    }
}
