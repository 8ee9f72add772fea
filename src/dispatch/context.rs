//! Per-request data handed to middleware and handlers.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{HttpError, RouteError};

/// Parsed query string.
///
/// Every value of a repeated key is kept in arrival order. [`get`](Self::get)
/// returns the first; serialization renders one value as a string and
/// several as an array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, Vec<String>>);

impl Query {
    /// Decode an `application/x-www-form-urlencoded` query (no leading `?`).
    pub fn parse(raw: &str) -> Self {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            values.entry(key.into_owned()).or_default().push(value.into_owned());
        }
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, values) in &self.0 {
            match values.as_slice() {
                [single] => map.serialize_entry(key, single)?,
                many => map.serialize_entry(key, many)?,
            }
        }
        map.end()
    }
}

#[derive(Debug, Default)]
struct ResponseParts {
    status: Option<StatusCode>,
    headers: HeaderMap,
}

/// Lower-level response handle shared by every stage of a chain.
///
/// The hosting layer applies the status override and extra headers to
/// whatever the chain returns.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle(Arc<Mutex<ResponseParts>>);

impl ResponseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn parts(&self) -> MutexGuard<'_, ResponseParts> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_status(&self, status: StatusCode) {
        self.parts().status = Some(status);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.parts().status
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.parts().headers.insert(name, value);
    }

    pub fn headers(&self) -> HeaderMap {
        self.parts().headers.clone()
    }
}

struct ContextInner {
    method: Method,
    path: String,
    query: Query,
    params: BTreeMap<String, String>,
    body: Value,
    raw_body: String,
    headers: HeaderMap,
    ip: Option<SocketAddr>,
    state: DashMap<String, Value>,
    response: ResponseHandle,
}

/// The per-request bundle. Cheap to clone; clones share `state` and the
/// response handle.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        method: Method,
        path: String,
        query: Query,
        params: BTreeMap<String, String>,
        body: Option<Value>,
        raw_body: String,
        headers: HeaderMap,
        ip: Option<SocketAddr>,
        response: ResponseHandle,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                method,
                path,
                query,
                params,
                body: body.unwrap_or(Value::Null),
                raw_body,
                headers,
                ip,
                state: DashMap::new(),
                response,
            }),
        }
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn query(&self) -> &Query {
        &self.inner.query
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.inner.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.inner.params.get(name).map(String::as_str)
    }

    /// Parsed JSON body; `Null` when the request had none.
    pub fn body(&self) -> &Value {
        &self.inner.body
    }

    /// Deserialize the body, failing with `400 INVALID_BODY`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        T::deserialize(&self.inner.body).map_err(|e| {
            tracing::debug!(error = %e, "Request body rejected");
            HttpError::bad_request("INVALID_BODY").into()
        })
    }

    pub fn raw_body(&self) -> &str {
        &self.inner.raw_body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Header value by case-insensitive name, if it is valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn ip(&self) -> Option<SocketAddr> {
        self.inner.ip
    }

    /// Store a value for later stages of the same chain.
    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.inner.state.insert(key.into(), value);
    }

    pub fn state(&self, key: &str) -> Option<Value> {
        self.inner.state.get(key).map(|entry| entry.value().clone())
    }

    pub fn response(&self) -> &ResponseHandle {
        &self.inner.response
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.inner.method)
            .field("path", &self.inner.path)
            .field("query", &self.inner.query)
            .field("params", &self.inner.params)
            .field("body", &self.inner.body)
            .finish_non_exhaustive()
    }
}
