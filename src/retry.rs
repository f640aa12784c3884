use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{
    header::{HeaderMap, RETRY_AFTER},
    StatusCode,
};

use crate::{decode, ClientOptions, OmopHubError};

/// What the policy decided about one failed attempt.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// Retry after the given failure. `suggested_delay` comes from the
    /// server (`Retry-After`) and takes precedence over computed backoff.
    Retryable {
        error: OmopHubError,
        suggested_delay: Option<Duration>,
    },
    /// Do not retry; surface the error as-is.
    Fatal(OmopHubError),
}

/// Retry decision logic shared by the async and blocking executors.
///
/// The policy never sleeps and never touches the network; the executors own
/// the loop and the waiting, this type owns every decision.
#[derive(Clone, Debug)]
pub(crate) struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_fraction: f64,
}

impl RetryPolicy {
    pub(crate) fn new(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            base_delay: Duration::from_millis(options.base_delay_ms),
            max_delay: Duration::from_millis(options.max_delay_ms),
            jitter_fraction: options.jitter_fraction.max(0.0),
        }
    }

    pub(crate) fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
    /// capped, plus uniform jitter in `[0, jitter_fraction * delay]`. The
    /// final value never exceeds the configured maximum.
    pub(crate) fn backoff_delay(&self, attempt: u32) -> Duration {
        let max_ms = self.max_delay.as_millis() as u64;
        let base_ms = self.base_delay.as_millis() as u64;
        let scaled = base_ms.saturating_mul(1u64 << attempt.min(16));
        let capped = scaled.min(max_ms);

        let jitter_ceiling = capped as f64 * self.jitter_fraction;
        let jitter = if jitter_ceiling > 0.0 {
            rand::rng().random_range(0.0..=jitter_ceiling) as u64
        } else {
            0
        };

        Duration::from_millis(capped.saturating_add(jitter).min(max_ms))
    }

    /// Clamps a server-suggested delay to the configured ceiling.
    pub(crate) fn clamp(&self, delay: Duration) -> Duration {
        delay.min(self.max_delay)
    }
}

/// Classifies a non-success HTTP response.
///
/// 429 and 5xx are retryable; every other status is the caller's fault and
/// fails on the first attempt.
pub(crate) fn classify_http_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: String,
) -> AttemptOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let suggested = retry_after(headers);
        AttemptOutcome::Retryable {
            error: OmopHubError::RateLimited {
                retry_after: suggested,
            },
            suggested_delay: suggested,
        }
    } else if status.is_server_error() {
        AttemptOutcome::Retryable {
            error: OmopHubError::Server {
                status: status.as_u16(),
                body,
            },
            suggested_delay: None,
        }
    } else {
        AttemptOutcome::Fatal(decode::client_error(status.as_u16(), headers, &body))
    }
}

/// Classifies a `reqwest` failure: connectivity problems are retryable,
/// request construction problems are not.
pub(crate) fn classify_transport_failure(err: reqwest::Error) -> AttemptOutcome {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        AttemptOutcome::Retryable {
            error: OmopHubError::Transport(err),
            suggested_delay: None,
        }
    } else {
        AttemptOutcome::Fatal(OmopHubError::Transport(err))
    }
}

/// Parses a `Retry-After` header value: integer seconds or an HTTP-date.
///
/// Zero or negative values mean "retry immediately", not "do not retry".
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return Some(Duration::from_secs(seconds.max(0) as u64));
    }
    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.with_timezone(&Utc) - Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn policy(base_ms: u64, max_ms: u64, jitter: f64) -> RetryPolicy {
        RetryPolicy::new(&ClientOptions {
            base_delay_ms: base_ms,
            max_delay_ms: max_ms,
            jitter_fraction: jitter,
            ..ClientOptions::default()
        })
    }

    fn headers_with_retry_after(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn backoff_doubles_without_jitter_until_capped() {
        let policy = policy(100, 1_000, 0.0);
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(800));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_delay(10), Duration::from_millis(1_000));
    }

    #[test]
    fn backoff_with_jitter_stays_within_bound() {
        let policy = policy(100, 60_000, 0.5);
        for attempt in 0..8u32 {
            let bound = ((100u64 << attempt) as f64 * 1.5) as u64;
            for _ in 0..50 {
                let delay = policy.backoff_delay(attempt).as_millis() as u64;
                assert!(delay >= 100u64 << attempt);
                assert!(delay <= bound, "attempt {attempt}: {delay} > {bound}");
            }
        }
    }

    #[test]
    fn backoff_never_exceeds_max_delay_even_with_jitter() {
        let policy = policy(400, 500, 1.0);
        for _ in 0..100 {
            assert!(policy.backoff_delay(1) <= Duration::from_millis(500));
        }
    }

    #[test]
    fn large_attempt_counts_do_not_overflow() {
        let policy = policy(1_000, 30_000, 0.0);
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn retry_after_integer_seconds() {
        let headers = headers_with_retry_after("17");
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(17)));
    }

    #[test]
    fn retry_after_zero_means_retry_immediately() {
        let headers = headers_with_retry_after("0");
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn retry_after_negative_clamps_to_zero() {
        let headers = headers_with_retry_after("-5");
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn retry_after_http_date_in_the_past_clamps_to_zero() {
        let headers = headers_with_retry_after("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn retry_after_http_date_in_the_future_yields_positive_delay() {
        let future = Utc::now() + chrono::Duration::seconds(90);
        let headers = headers_with_retry_after(&future.to_rfc2822());
        let delay = retry_after(&headers).unwrap();
        assert!(delay > Duration::from_secs(80));
        assert!(delay <= Duration::from_secs(90));
    }

    #[test]
    fn retry_after_garbage_is_ignored() {
        let headers = headers_with_retry_after("soon");
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn rate_limit_is_retryable_with_suggested_delay() {
        let headers = headers_with_retry_after("3");
        let outcome =
            classify_http_failure(StatusCode::TOO_MANY_REQUESTS, &headers, String::new());
        match outcome {
            AttemptOutcome::Retryable {
                suggested_delay, ..
            } => assert_eq!(suggested_delay, Some(Duration::from_secs(3))),
            AttemptOutcome::Fatal(_) => panic!("429 must be retryable"),
        }
    }

    #[test]
    fn server_error_is_retryable_without_suggested_delay() {
        let outcome = classify_http_failure(
            StatusCode::SERVICE_UNAVAILABLE,
            &HeaderMap::new(),
            "oops".to_owned(),
        );
        assert!(matches!(
            outcome,
            AttemptOutcome::Retryable {
                suggested_delay: None,
                ..
            }
        ));
    }

    #[test]
    fn client_error_is_fatal() {
        let outcome =
            classify_http_failure(StatusCode::NOT_FOUND, &HeaderMap::new(), String::new());
        assert!(matches!(outcome, AttemptOutcome::Fatal(_)));
    }
}
