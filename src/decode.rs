use std::time::Duration;

use serde_json::Value;

use crate::{
    wire::RawOptions, Body, Headers, Query, QueryValue, RequestError, RequestOptions, Result,
    Retry, RetryDelay,
};

pub(crate) fn decode_options(value: Value) -> Result<RequestOptions> {
    let raw: RawOptions = match value {
        Value::Null => return Ok(RequestOptions::default()),
        value @ Value::Object(_) => serde_json::from_value(value)
            .map_err(|err| RequestError::argument(format!("invalid options: {err}")))?,
        other => {
            return Err(RequestError::argument(format!(
                "options must be an object (or null), got {}",
                json_kind(&other)
            )))
        }
    };

    let mut options = RequestOptions::default();

    if let Some(qs) = raw.qs {
        let mut query = Query::new();
        for (key, value) in qs {
            if let Some(value) = decode_query_value(&key, value)? {
                query.insert(key, value);
            }
        }
        options.qs = Some(query);
    }

    if let Some(headers) = raw.headers {
        let mut decoded = Headers::new();
        for (name, value) in headers {
            match scalar_to_string(&value) {
                Some(value) => decoded.insert(name, value),
                None if value.is_null() => {}
                None => {
                    return Err(RequestError::argument(format!(
                        "header '{name}' must be a string, got {}",
                        json_kind(&value)
                    )))
                }
            }
        }
        options.headers = decoded;
    }

    options.json = raw.json;
    options.form = raw.form.map(Body::Text);
    options.body = raw.body.map(Body::Text);
    options.timeout_ms = raw.timeout.unwrap_or(0);
    options.with_credentials = raw.with_credentials.unwrap_or(false);
    if raw.retry.as_ref().is_some_and(is_truthy) {
        options.retry = Some(Retry::Default);
    }
    options.retry_delay = raw
        .retry_delay
        .map(|delay| RetryDelay::Fixed(Duration::from_millis(delay)));
    if let Some(max_retries) = raw.max_retries {
        options.max_retries = max_retries;
    }

    Ok(options)
}

fn decode_query_value(key: &str, value: Value) -> Result<Option<QueryValue>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                scalar_to_string(item).ok_or_else(|| {
                    RequestError::argument(format!(
                        "query parameter '{key}' contains a non-scalar {}",
                        json_kind(item)
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(|values| Some(QueryValue::Many(values))),
        other => scalar_to_string(&other)
            .map(|value| Some(QueryValue::One(value)))
            .ok_or_else(|| {
                RequestError::argument(format!(
                    "query parameter '{key}' must be a scalar or array, got {}",
                    json_kind(&other)
                ))
            }),
    }
}

/// JavaScript-style truthiness: `null`, `false`, `0` and `""` are falsy,
/// every array and object is truthy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
