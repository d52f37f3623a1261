//! Bounded retry loop for idempotent requests.
//!
//! A chain moves through `Attempting(0) -> Attempting(n + 1) -> ...` until
//! an attempt is not retried, at which point that attempt's outcome is
//! returned verbatim. Exhausting `max_retries` is not an error of its own:
//! the caller sees the last error or response.

use std::time::Duration;

use crate::{
    normalize::dispatch,
    options::DEFAULT_RETRY_DELAY,
    runtime::sleep,
    shape::shape,
    RequestError, RequestOptions, Response, Result, Retry, RetryDelay, Transport,
};

/// Decision taken after an attempt completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RetryStep {
    /// Run `attempt` (0-based) after `delay`.
    Retry { attempt: usize, delay: Duration },
    /// Resolve with the attempt's outcome.
    Finish,
}

/// Whether a request is handled by the retry loop at all.
pub(crate) fn engages(method: &str, options: &RequestOptions) -> bool {
    options.retry.is_some() && method == "GET"
}

/// Decides what follows attempt `attempt` (0-based) given its outcome.
pub(crate) fn next_step(
    options: &RequestOptions,
    attempt: usize,
    outcome: &Result<Response>,
) -> RetryStep {
    let (error, response) = match outcome {
        Ok(response) => (None, Some(response)),
        Err(err) => (Some(err), None),
    };
    if error.is_some_and(RequestError::is_argument) {
        return RetryStep::Finish;
    }

    let mut retry = error.is_some() || response.is_some_and(Response::is_error);
    if let Some(Retry::When(predicate)) = &options.retry {
        retry = predicate(error, response, attempt + 1);
    }
    if attempt >= options.max_retries {
        retry = false;
    }
    if !retry {
        return RetryStep::Finish;
    }

    let delay = match &options.retry_delay {
        Some(RetryDelay::Fixed(delay)) => *delay,
        Some(RetryDelay::Computed(delay)) => delay(error, response, attempt + 1),
        None => Duration::ZERO,
    };
    RetryStep::Retry {
        attempt: attempt + 1,
        delay: if delay.is_zero() {
            DEFAULT_RETRY_DELAY
        } else {
            delay
        },
    }
}

/// Runs a retry chain for an already validated, upper-cased `method`.
///
/// Every attempt is shaped from the same reduced options (see
/// `RequestOptions::for_retry_attempt`); the caller's options only feed
/// the retry decision and delay.
pub(crate) async fn run<T: Transport>(
    transport: &T,
    method: &str,
    url: &str,
    options: &RequestOptions,
    page_host: Option<&str>,
) -> Result<Response> {
    let attempt_options = options.for_retry_attempt();
    let mut attempt = 0;
    loop {
        let outcome = match shape(method, url, &attempt_options, page_host) {
            Ok(request) => dispatch(transport, request).await,
            Err(err) => Err(err),
        };

        match next_step(options, attempt, &outcome) {
            RetryStep::Finish => return outcome,
            RetryStep::Retry {
                attempt: next,
                delay,
            } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    url,
                    attempt = next,
                    delay_ms = delay.as_millis() as u64,
                    "retrying request"
                );
                sleep(delay).await;
                attempt = next;
            }
        }
    }
}
