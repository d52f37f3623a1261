use std::{fmt, sync::Arc, time::Duration};

use serde::Serialize;
use url::form_urlencoded;

use crate::{decode::decode_options, Headers, Query, RequestError, Response, Result};

/// Default ceiling on retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 5;
/// Delay used when no (or a zero) retry delay is configured.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Decides whether an attempt should be retried.
///
/// Receives the attempt's error or response and the 1-based attempt number.
pub type RetryPredicate = dyn Fn(Option<&RequestError>, Option<&Response>, usize) -> bool + Send + Sync;

/// Computes the backoff before the next attempt, with the same arguments
/// as [`RetryPredicate`].
pub type RetryDelayFn =
    dyn Fn(Option<&RequestError>, Option<&Response>, usize) -> Duration + Send + Sync;

/// Retry directive for idempotent (`GET`) requests.
#[derive(Clone)]
pub enum Retry {
    /// Retry on any error or on status >= 400.
    Default,
    /// Caller-supplied predicate; replaces the default decision entirely.
    When(Arc<RetryPredicate>),
}

impl fmt::Debug for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::When(_) => f.write_str("When(<fn>)"),
        }
    }
}

/// Backoff between retry attempts.
#[derive(Clone)]
pub enum RetryDelay {
    Fixed(Duration),
    Computed(Arc<RetryDelayFn>),
}

impl fmt::Debug for RetryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            Self::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

/// Raw request payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    /// Encodes pairs as `application/x-www-form-urlencoded`.
    ///
    /// Only the payload is produced; the caller sets the matching
    /// `Content-Type` header.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
        Self::Text(serializer.finish())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Per-request options.
///
/// Request options are read-only input: shaping and retrying never modify
/// the value the caller passed in.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    /// Query parameters merged into the URL.
    pub qs: Option<Query>,
    /// Request headers, sent with the casing supplied here.
    pub headers: Headers,
    /// JSON payload; forces `Content-Type: application/json`.
    pub json: Option<serde_json::Value>,
    /// Pre-encoded form payload; wins over `json` and `body`.
    pub form: Option<Body>,
    /// Raw payload, overridden by `json` and `form`.
    pub body: Option<Body>,
    /// Per-attempt timeout in milliseconds; `0` disables it.
    pub timeout_ms: u64,
    /// Include credentials on cross-origin requests.
    pub with_credentials: bool,
    /// Retry directive, honored for `GET` only.
    pub retry: Option<Retry>,
    /// Backoff between attempts; [`DEFAULT_RETRY_DELAY`] when unset.
    pub retry_delay: Option<RetryDelay>,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            qs: None,
            headers: Headers::new(),
            json: None,
            form: None,
            body: None,
            timeout_ms: 0,
            with_credentials: false,
            retry: None,
            retry_delay: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from a dynamic JSON object using the camelCase keys
    /// `qs`, `headers`, `json`, `form`, `body`, `timeout`, `withCredentials`,
    /// `retry`, `retryDelay` and `maxRetries`.
    ///
    /// `null` yields the defaults, any other non-object is rejected and
    /// unknown keys are ignored. `retry` enables the default predicate for
    /// any truthy value (not `null`, `false`, `0` or `""`).
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        decode_options(value)
    }

    pub fn with_qs(mut self, qs: impl Into<Query>) -> Self {
        self.qs = Some(qs.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: impl Into<Headers>) -> Self {
        self.headers = headers.into();
        self
    }

    /// Serializes `value` as the JSON payload.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)
            .map_err(|err| RequestError::Encode(format!("invalid JSON payload: {err}")))?;
        self.json = Some(json);
        Ok(self)
    }

    pub fn with_form(mut self, form: impl Into<Body>) -> Self {
        self.form = Some(form.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Enables retries with the default predicate.
    pub fn with_retry(mut self) -> Self {
        self.retry = Some(Retry::Default);
        self
    }

    /// Enables retries decided by `predicate`.
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&RequestError>, Option<&Response>, usize) -> bool + Send + Sync + 'static,
    {
        self.retry = Some(Retry::When(Arc::new(predicate)));
        self
    }

    pub fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay = Some(RetryDelay::Fixed(Duration::from_millis(delay_ms)));
        self
    }

    pub fn retry_delay_with<F>(mut self, delay: F) -> Self
    where
        F: Fn(Option<&RequestError>, Option<&Response>, usize) -> Duration + Send + Sync + 'static,
    {
        self.retry_delay = Some(RetryDelay::Computed(Arc::new(delay)));
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Options used for each attempt of a retry chain.
    ///
    /// Only `qs`, `headers` and `timeout_ms` carry over; the retry
    /// directive is stripped so an attempt can never start a nested chain,
    /// and payload and credential fields are dropped as well.
    pub(crate) fn for_retry_attempt(&self) -> Self {
        Self {
            qs: self.qs.clone(),
            headers: self.headers.clone(),
            timeout_ms: self.timeout_ms,
            ..Self::default()
        }
    }
}
