//! Converts the outcome of one transport call into a single [`Response`]
//! or [`RequestError`].

use std::{collections::BTreeMap, time::Duration};

use crate::{
    runtime::{with_deadline, Stopwatch},
    RawResponse, RequestError, Response, Result, Transport, TransportRequest,
};

/// Parses a raw header blob into a map of lower-cased names to trimmed
/// values.
///
/// Each line is split on its first colon; lines without a colon are
/// skipped. When a name repeats, the last occurrence wins.
pub fn parse_headers(raw: &str) -> BTreeMap<String, String> {
    raw.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_owned()))
        .collect()
}

pub(crate) fn into_response(raw: RawResponse, url: String) -> Response {
    Response {
        status: raw.status,
        headers: parse_headers(&raw.raw_headers),
        body: raw.body,
        url,
    }
}

/// Performs one attempt and resolves it exactly once.
///
/// With a timeout configured the transport races a timer; if the timer
/// fires first the attempt fails with [`RequestError::Timeout`] and the
/// in-flight transport future is dropped, so a late completion is ignored.
pub(crate) async fn dispatch<T: Transport>(transport: &T, request: TransportRequest) -> Result<Response> {
    #[cfg(feature = "tracing")]
    tracing::debug!(method = %request.method, url = %request.url, "dispatching request");

    let stopwatch = Stopwatch::start();
    let outcome = if request.timeout_ms > 0 {
        let deadline = Duration::from_millis(request.timeout_ms);
        match with_deadline(deadline, transport.send(&request)).await {
            Some(outcome) => outcome,
            None => {
                let duration_ms = stopwatch.elapsed_ms();
                #[cfg(feature = "tracing")]
                tracing::debug!(url = %request.url, duration_ms, "request timed out");
                return Err(RequestError::Timeout { duration_ms });
            }
        }
    } else {
        transport.send(&request).await
    };

    outcome.map(|raw| into_response(raw, request.url))
}
