use serde::Deserialize;
use serde_json::{Map, Value};

/// Dynamic options object as accepted by `RequestOptions::from_value`.
///
/// Unknown keys are ignored; `null` values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOptions {
    pub qs: Option<Map<String, Value>>,
    pub headers: Option<Map<String, Value>>,
    pub json: Option<Value>,
    pub form: Option<String>,
    pub body: Option<String>,
    pub timeout: Option<u64>,
    pub with_credentials: Option<bool>,
    pub retry: Option<Value>,
    pub retry_delay: Option<u64>,
    pub max_retries: Option<usize>,
}
