use std::time::Duration;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum OmopHubError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// HTTP 429 from the API.
    #[error("rate limited (http 429)")]
    RateLimited {
        /// Delay advertised via the `Retry-After` response header, if any.
        retry_after: Option<Duration>,
    },
    /// HTTP 5xx with raw response body.
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    /// Non-429 4xx. Not retried: the request itself is wrong.
    #[error("client error {status}: {message}")]
    Client {
        status: u16,
        /// Error message from the API payload, or the raw body.
        message: String,
        /// Machine-readable error code from the API payload.
        code: Option<String>,
        /// `X-Request-Id` response header, for support diagnostics.
        request_id: Option<String>,
    },
    /// 2xx response whose envelope reports `success: false`.
    #[error("api error: {message}")]
    Api {
        message: String,
        /// Machine-readable error code from the API payload.
        code: Option<String>,
    },
    /// Success status but the body did not decode into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Retry budget spent; wraps the failure from the final attempt.
    #[error("retries exhausted after {attempts} attempts")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        source: Box<OmopHubError>,
    },
}
