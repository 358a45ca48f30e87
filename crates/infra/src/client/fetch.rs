//! Request descriptions and raw responses

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Body of an outgoing request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    /// Pre-encoded body, sent with whatever `Content-Type` the headers carry
    Raw(String),
}

/// One request against the client's host
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    /// Host-relative path, query string allowed
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Per-call header overrides, applied last
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl FetchRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.body =
            RequestBody::Form(fields.into_iter().map(|(k, v)| (k.into(), v.to_string())).collect());
        self
    }

    #[must_use]
    pub fn raw(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    #[must_use]
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Add a per-call header. Values that are not valid header text are skipped.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// Fully read response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body parsed as JSON, `None` when it is not JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.headers.get(LOCATION).and_then(|value| value.to_str().ok()).map(str::to_string)
    }
}

/// Take `key` out of `body`, falling back to `default` when missing or null.
pub fn project(mut body: Value, key: &str, default: Value) -> Value {
    match body.get_mut(key).map(Value::take) {
        Some(Value::Null) | None => default,
        Some(value) => value,
    }
}

/// Follow a chain of object keys, with the same fallback.
pub fn project_path(body: Value, keys: &[&str], default: Value) -> Value {
    let mut current = body;
    for key in keys {
        current = project(current, key, Value::Null);
    }
    if current.is_null() {
        default
    } else {
        current
    }
}

/// Text of a loosely typed `error` field: a string, or an array of strings.
///
/// Empty strings and empty arrays count as no error.
#[must_use]
pub fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    }
}
