use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::{RequestError, Result};

/// Normalized result of one completed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers; names are lower-cased and values trimmed.
    pub headers: BTreeMap<String, String>,
    /// Response body text.
    pub body: String,
    /// Requested URL after the query string merge.
    pub url: String,
}

impl Response {
    /// Returns a header value; the lookup name may use any casing.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `true` for 4xx and 5xx statuses.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Fails with [`RequestError::Status`] unless the status is below 300.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status >= 300 {
            return Err(RequestError::Status {
                status: self.status,
                url: self.url,
                body: self.body,
            });
        }
        Ok(self)
    }

    /// Consumes the response and returns its body, failing on status >= 300.
    pub fn into_body(self) -> Result<String> {
        self.error_for_status().map(|response| response.body)
    }

    /// Decodes the body as JSON, failing on status >= 300.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.status >= 300 {
            return Err(RequestError::Status {
                status: self.status,
                url: self.url.clone(),
                body: self.body.clone(),
            });
        }
        serde_json::from_str(&self.body).map_err(|err| {
            RequestError::Decode(format!("invalid JSON response body: {err}; body: {}", self.body))
        })
    }
}
