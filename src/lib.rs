//! `browser-request` sends HTTP requests through a single async entry point
//! with retry, query-string, JSON/form encoding and timeout policies.
//!
//! - [`RequestClient::request`] shapes and sends one logical request.
//! - `GET` requests with a [`Retry`] directive are retried with a bounded,
//!   delayed loop.
//! - Responses are normalized into [`Response`]; timeouts and transport
//!   failures surface as [`RequestError`].
//!
//! The network exchange itself is a [`Transport`]; [`ReqwestTransport`]
//! is the default and uses the browser Fetch API on `wasm32`.

mod client;
mod decode;
mod error;
mod headers;
mod normalize;
mod options;
mod query;
mod response;
mod retry;
mod runtime;
mod shape;
mod transport;
mod wire;

pub use client::RequestClient;
pub use error::RequestError;
pub use headers::Headers;
pub use normalize::parse_headers;
pub use options::{
    Body, RequestOptions, Retry, RetryDelay, RetryDelayFn, RetryPredicate, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY,
};
pub use query::{merge_query, Query, QueryValue};
pub use response::Response;
pub use shape::{is_cross_origin, shape};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportRequest};

pub type Result<T> = std::result::Result<T, RequestError>;
