use std::{fmt, future::Future, time::Duration};

use url::Url;

use crate::{runtime::Stopwatch, Body, Headers, RequestError, Result};

/// Fully shaped parameters of one transport call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
    /// Upper-cased method.
    pub method: String,
    /// Final URL, query string included.
    pub url: String,
    /// Headers to set, one call per entry.
    pub headers: Headers,
    /// Payload, or `None` for an explicit "no body".
    pub body: Option<Body>,
    /// Per-attempt timeout in milliseconds; `0` means none.
    pub timeout_ms: u64,
    /// Whether credentials are included on cross-origin requests.
    pub with_credentials: bool,
}

/// What a transport reports once an exchange completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Raw header blob: one `name: value` pair per line.
    pub raw_headers: String,
    pub body: String,
}

/// One-shot network exchange.
///
/// Implementations perform a single HTTP exchange and either complete with
/// a [`RawResponse`] or fail with [`RequestError::Transport`] (or
/// [`RequestError::Timeout`] when they enforce the deadline themselves).
/// Retries, timeouts and header normalization are layered on top by
/// [`RequestClient`](crate::RequestClient).
pub trait Transport {
    fn send(&self, request: &TransportRequest) -> impl Future<Output = Result<RawResponse>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &TransportRequest) -> impl Future<Output = Result<RawResponse>> {
        (**self).send(request)
    }
}

/// [`Transport`] backed by `reqwest`.
///
/// On `wasm32` this goes through the browser Fetch API. Relative URLs are
/// resolved against the base URL set with
/// [`ReqwestTransport::with_base_url`]; without one only absolute URLs can
/// be sent. [`RequestClient::from_location`](crate::RequestClient) sets it
/// to the page location.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: Option<Url>,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured `reqwest` client.
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Resolves relative request URLs against `base_url`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|err| RequestError::transport(format!("cannot resolve URL '{url}': {err}")))
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            RequestError::argument(format!("'{}' is not a valid HTTP method", request.method))
        })?;
        let url = self.resolve(&request.url)?;

        let mut builder = self.http.request(method, url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        // On WASM, reqwest uses AbortController for the timeout.
        if request.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(request.timeout_ms));
        }
        #[cfg(target_arch = "wasm32")]
        if request.with_credentials {
            builder = builder.fetch_credentials_include();
        }
        builder = match &request.body {
            Some(Body::Text(text)) => builder.body(text.clone()),
            Some(Body::Bytes(bytes)) => builder.body(bytes.clone()),
            None => builder,
        };

        let stopwatch = Stopwatch::start();
        let response = builder
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, &stopwatch))?;

        let status = response.status().as_u16();
        let raw_headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                format!("{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()))
            })
            .collect::<String>();
        let body = response
            .text()
            .await
            .map_err(|err| map_reqwest_error(err, &stopwatch))?;

        Ok(RawResponse {
            status,
            raw_headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error, stopwatch: &Stopwatch) -> RequestError {
    if err.is_timeout() {
        RequestError::Timeout {
            duration_ms: stopwatch.elapsed_ms(),
        }
    } else {
        RequestError::transport(err)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::ReqwestTransport;

    #[test]
    fn relative_urls_resolve_against_base() {
        let base = Url::parse("https://app.example.com/pages/index.html").expect("valid base");
        let transport = ReqwestTransport::new().with_base_url(base);
        assert_eq!(
            transport.resolve("/api?x=1").expect("must resolve").as_str(),
            "https://app.example.com/api?x=1"
        );
        assert_eq!(
            transport.resolve("items").expect("must resolve").as_str(),
            "https://app.example.com/pages/items"
        );
    }

    #[test]
    fn new_transport_has_no_base_url() {
        assert!(ReqwestTransport::new().base_url().is_none());
    }

    #[test]
    fn relative_url_without_base_is_transport_error() {
        let err = ReqwestTransport::new()
            .resolve("/api")
            .expect_err("must fail");
        assert!(matches!(err, crate::RequestError::Transport(_)));
    }

    #[test]
    fn debug_lists_base_url() {
        let base = Url::parse("https://app.example.com/").expect("valid base");
        let debug = format!("{:?}", ReqwestTransport::new().with_base_url(base));
        assert!(debug.contains("https://app.example.com/"));
    }
}
