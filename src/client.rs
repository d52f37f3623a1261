use std::fmt;

use url::Url;

use crate::{
    normalize::dispatch,
    retry,
    shape::{normalize_method, shape},
    ReqwestTransport, RequestError, RequestOptions, Response, Result, Transport,
};

/// Request entry point: shapes, dispatches and (for `GET`) retries
/// requests over a [`Transport`].
///
/// The client holds no per-request state; every call builds its own
/// attempt chain, so one client can serve any number of interleaved
/// requests.
#[derive(Clone)]
pub struct RequestClient<T = ReqwestTransport> {
    transport: T,
    page_host: Option<String>,
}

impl<T> fmt::Debug for RequestClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("page_host", &self.page_host)
            .finish_non_exhaustive()
    }
}

impl Default for RequestClient<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestClient<ReqwestTransport> {
    /// Creates a client without a page origin; only absolute URLs can be
    /// sent and all of them count as cross-origin.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    /// Creates a client that behaves as if running on the page at
    /// `base_url`: relative URLs resolve against it and its `host[:port]`
    /// decides which requests are same-origin.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use browser_request::RequestClient;
    ///
    /// let client = RequestClient::with_base_url("https://app.example.com/").unwrap();
    /// assert_eq!(client.page_host(), Some("app.example.com"));
    /// ```
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|err| RequestError::argument(format!("invalid base URL '{base_url}': {err}")))?;
        let page_host = url_host(&base);
        Ok(Self {
            transport: ReqwestTransport::new().with_base_url(base),
            page_host,
        })
    }

    /// Creates a client from the `BROWSER_REQUEST_BASE_URL` environment
    /// variable (see [`RequestClient::with_base_url`]).
    ///
    /// **Not available on `wasm32` targets**; use
    /// [`RequestClient::from_location`] there.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("BROWSER_REQUEST_BASE_URL")
            .map_err(|_| "missing BROWSER_REQUEST_BASE_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("BROWSER_REQUEST_BASE_URL is set but empty".to_owned());
        }
        Self::with_base_url(base_url.trim()).map_err(|err| err.to_string())
    }

    /// Creates a client for the current page, reading `location.href` from
    /// the JS global.
    #[cfg(target_arch = "wasm32")]
    pub fn from_location() -> Result<Self> {
        use wasm_bindgen::JsValue;

        let location = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("location"))
            .map_err(|_| RequestError::argument("page location is unavailable"))?;
        let href = js_sys::Reflect::get(&location, &JsValue::from_str("href"))
            .ok()
            .and_then(|href| href.as_string())
            .ok_or_else(|| RequestError::argument("page location is unavailable"))?;
        Self::with_base_url(&href)
    }
}

impl<T: Transport> RequestClient<T> {
    /// Creates a client over a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            page_host: None,
        }
    }

    /// Sets the page's `host[:port]` used for cross-origin detection.
    pub fn with_page_host(mut self, page_host: impl Into<String>) -> Self {
        self.page_host = Some(page_host.into());
        self
    }

    pub fn page_host(&self) -> Option<&str> {
        self.page_host.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends one logical request and resolves exactly once.
    ///
    /// Argument errors are returned before the transport is touched. A
    /// status >= 400 is still `Ok`; only the retry predicate treats it as a
    /// failure. `GET` requests with a retry directive run through the
    /// retry loop, every other request is sent once.
    pub async fn request(
        &self,
        method: &str,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        let method = normalize_method(method)?;
        if retry::engages(&method, options) {
            return retry::run(&self.transport, &method, url, options, self.page_host()).await;
        }
        let request = shape(&method, url, options, self.page_host())?;
        dispatch(&self.transport, request).await
    }

    /// Callback form of [`RequestClient::request`]: `callback` runs exactly
    /// once with the outcome.
    pub async fn request_with<F>(&self, method: &str, url: &str, options: &RequestOptions, callback: F)
    where
        F: FnOnce(Result<Response>),
    {
        callback(self.request(method, url, options).await);
    }

    pub async fn get(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        self.request("GET", url, options).await
    }

    pub async fn post(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        self.request("POST", url, options).await
    }

    pub async fn put(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        self.request("PUT", url, options).await
    }

    pub async fn patch(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        self.request("PATCH", url, options).await
    }

    pub async fn delete(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        self.request("DELETE", url, options).await
    }
}

/// `host[:port]` of a URL, omitting the scheme's default port like
/// `location.host` does.
fn url_host(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::RequestClient;

    #[test]
    fn base_url_sets_page_host() {
        let client = RequestClient::with_base_url("http://127.0.0.1:8080/app/").expect("valid");
        assert_eq!(client.page_host(), Some("127.0.0.1:8080"));

        let client = RequestClient::with_base_url("https://example.com:443/").expect("valid");
        assert_eq!(client.page_host(), Some("example.com"));
    }

    #[test]
    fn invalid_base_url_is_argument_error() {
        let err = RequestClient::with_base_url("not a url").expect_err("must fail");
        assert!(err.is_argument());
    }

    #[test]
    fn debug_shows_page_host() {
        let client = RequestClient::new().with_page_host("app.example.com");
        assert!(format!("{client:?}").contains("app.example.com"));
    }
}
