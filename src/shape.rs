//! Turns a method, URL and [`RequestOptions`] into the exact parameters
//! handed to a [`Transport`](crate::Transport).
//!
//! Shaping is pure: it performs no I/O and never modifies the options.
//! Steps run in a fixed order and later steps win on conflicts:
//! method validation, cross-origin header policy, query string merge,
//! JSON body, form body, then empty-body normalization.

use crate::{
    decode::is_truthy, merge_query, Body, RequestError, RequestOptions, Result, TransportRequest,
};

pub(crate) const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub(crate) const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// Shapes one transport call.
///
/// `page_host` is the `host[:port]` of the page issuing the request; with
/// `None` every URL that names a host is treated as cross-origin.
pub fn shape(
    method: &str,
    url: &str,
    options: &RequestOptions,
    page_host: Option<&str>,
) -> Result<TransportRequest> {
    let method = normalize_method(method)?;

    let mut headers = options.headers.clone();
    if !is_cross_origin(url, page_host) {
        headers.insert(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE);
    }

    let url = match &options.qs {
        Some(qs) => merge_query(url, qs),
        None => url.to_owned(),
    };

    let mut body = options.body.clone();
    if let Some(json) = options.json.as_ref().filter(|json| is_truthy(json)) {
        let encoded = serde_json::to_string(json)
            .map_err(|err| RequestError::Encode(format!("invalid JSON payload: {err}")))?;
        body = Some(Body::Text(encoded));
        headers.insert("Content-Type", "application/json");
    }
    if let Some(form) = options.form.as_ref().filter(|form| !form.is_empty()) {
        body = Some(form.clone());
    }

    Ok(TransportRequest {
        method,
        url,
        headers,
        // Transports get an explicit "no body" rather than an empty payload.
        body: body.filter(|body| !body.is_empty()),
        timeout_ms: options.timeout_ms,
        with_credentials: options.with_credentials,
    })
}

/// Validates and upper-cases a request method.
pub(crate) fn normalize_method(method: &str) -> Result<String> {
    if method.is_empty() {
        return Err(RequestError::argument("the method must be a non-empty string"));
    }
    let method = method.to_ascii_uppercase();
    reqwest::Method::from_bytes(method.as_bytes())
        .map_err(|_| RequestError::argument(format!("'{method}' is not a valid HTTP method")))?;
    Ok(method)
}

/// Reports whether `url` targets a host other than `page_host`.
///
/// Only URLs with a `scheme://host` or `//host` prefix can be cross-origin;
/// relative paths always stay on the page's origin.
pub fn is_cross_origin(url: &str, page_host: Option<&str>) -> bool {
    match url_host(url) {
        Some(host) => Some(host) != page_host,
        None => false,
    }
}

fn url_host(url: &str) -> Option<&str> {
    let rest = match url.split_once(':') {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
        {
            rest
        }
        _ => url,
    };
    let authority = rest.strip_prefix("//")?;
    let end = authority.find('/').unwrap_or(authority.len());
    (end > 0).then(|| &authority[..end])
}
