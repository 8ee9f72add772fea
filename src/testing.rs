//! In-process test harness.
//!
//! [`TestClient`] drives a [`RoutingEngine`] without a listener: it builds a
//! [`DispatchRequest`], dispatches it, and passes the reply through a JSON
//! string round-trip so callers see what a real client would.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::config::Config;
use crate::dispatch::{DispatchRequest, Reply, RoutingEngine};
use crate::error::{HttpError, LoadError, RouteError};
use crate::routing::ModuleRegistry;

#[derive(Debug, Clone)]
pub struct TestClient {
    engine: RoutingEngine,
}

impl TestClient {
    pub fn bootstrap(config: Config, registry: &ModuleRegistry) -> Result<Self, LoadError> {
        Ok(Self::new(RoutingEngine::bootstrap(config, registry)?))
    }

    pub fn new(engine: RoutingEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    /// `GET path?query` with an empty object body. The `?` is appended even
    /// for an empty query.
    pub async fn get(&self, path: &str, query: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Value, RouteError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        let request = DispatchRequest::new("GET", format!("{path}?{query}"))
            .with_body(Some(Value::Object(Default::default())), "")
            .with_headers(header_map(headers)?);
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value, headers: &[(&str, &str)]) -> Result<Value, RouteError> {
        self.with_body("POST", path, body, headers).await
    }

    pub async fn put(&self, path: &str, body: Value, headers: &[(&str, &str)]) -> Result<Value, RouteError> {
        self.with_body("PUT", path, body, headers).await
    }

    pub async fn patch(&self, path: &str, body: Value, headers: &[(&str, &str)]) -> Result<Value, RouteError> {
        self.with_body("PATCH", path, body, headers).await
    }

    pub async fn delete(&self, path: &str, body: Value, headers: &[(&str, &str)]) -> Result<Value, RouteError> {
        self.with_body("DELETE", path, body, headers).await
    }

    /// Dispatch a hand-built request and return the raw reply.
    pub async fn handle_request(&self, request: DispatchRequest) -> Result<Reply, RouteError> {
        self.engine.handle_request(request).await
    }

    async fn with_body(&self, method: &str, path: &str, body: Value, headers: &[(&str, &str)]) -> Result<Value, RouteError> {
        let request = DispatchRequest::new(method, path)
            .with_json(body)
            .with_headers(header_map(headers)?);
        self.send(request).await
    }

    async fn send(&self, request: DispatchRequest) -> Result<Value, RouteError> {
        let reply = self.engine.handle_request(request).await?;
        let wire = serde_json::to_string(&reply.to_json_value())?;
        Ok(serde_json::from_str(&wire)?)
    }
}

fn header_map(headers: &[(&str, &str)]) -> Result<HeaderMap, RouteError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::bad_request("INVALID_HEADER"))?;
        let value = HeaderValue::from_str(value).map_err(|_| HttpError::bad_request("INVALID_HEADER"))?;
        map.append(name, value);
    }
    Ok(map)
}
