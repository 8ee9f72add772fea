//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router sending every method and path to the engine
//! - Wire up middleware (CORS, tracing, request ID)
//! - Let callers inject their own layers before the standard stack
//! - Bind server to listener and drain on shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, HeaderValue, Method, Request},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{Config, CorsConfig, ValidatedConfig};
use crate::dispatch::{DispatchRequest, ResponseHandle, RoutingEngine};
use crate::error::LoadError;
use crate::http::request::{read_body, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::{error_response, reply_response};
use crate::lifecycle::shutdown;
use crate::routing::ModuleRegistry;

/// HTTP front end of a [`RoutingEngine`].
pub struct HttpServer {
    app: Router,
    engine: RoutingEngine,
}

impl HttpServer {
    /// Resolve config, load every route and build the router.
    pub fn bootstrap(config: Config, registry: &ModuleRegistry) -> Result<Self, LoadError> {
        Ok(Self::new(RoutingEngine::bootstrap(config, registry)?))
    }

    pub fn new(engine: RoutingEngine) -> Self {
        let app = Router::new()
            .fallback(dispatch_handler)
            .with_state(engine.clone());
        Self { app, engine }
    }

    /// Add layers or routes around the dispatcher. They run inside CORS
    /// and request tracing.
    pub fn with_layer_fn(mut self, f: impl FnOnce(Router) -> Router) -> Self {
        self.app = f(self.app);
        self
    }

    /// The complete router, standard middleware included.
    pub fn router(&self) -> Router {
        let mut router = self.app.clone();
        if let Some(cors) = &self.engine.config().server.cors {
            router = router.layer(build_cors(cors));
        }

        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        router
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuidV4))
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    pub fn config(&self) -> &ValidatedConfig {
        self.engine.config()
    }

    /// Bind the configured port on all interfaces.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], self.config().server.port))).await
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.engine.routes().len(),
            "HTTP server starting"
        );

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Every request lands here: buffer the body, dispatch, translate.
async fn dispatch_handler(State(engine): State<RoutingEngine>, request: Request<Body>) -> Response {
    let server = &engine.config().server;
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (parts, body) = request.into_parts();
    let body = match read_body(&parts.headers, body, server.body_limit).await {
        Ok(body) => body,
        Err(e) => return error_response(&e.into(), server),
    };

    let handle = ResponseHandle::new();
    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    let request = DispatchRequest {
        method: parts.method.as_str().to_string(),
        url,
        body: body.json,
        raw_body: body.raw,
        headers: parts.headers,
        remote_addr,
        response: handle.clone(),
    };

    match engine.handle_request(request).await {
        Ok(reply) => reply_response(reply, &handle).unwrap_or_else(|e| error_response(&e, server)),
        Err(e) => error_response(&e, server),
    }
}

/// Translate the CORS block into a tower-http layer.
///
/// Empty lists allow anything. With credentials enabled, "anything" is
/// expressed by mirroring the request, since wildcards are not allowed there.
pub fn build_cors(cors: &CorsConfig) -> CorsLayer {
    let any_origin = cors.allowed_origins.is_empty() || cors.allowed_origins.iter().any(|o| o == "*");
    let origin = if any_origin {
        if cors.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::from(Any)
        }
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let methods = if cors.allowed_methods.is_empty() {
        if cors.allow_credentials {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::from(Any)
        }
    } else {
        let methods: Vec<Method> = cors
            .allowed_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .collect();
        AllowMethods::list(methods)
    };

    let headers = if cors.allowed_headers.is_empty() {
        if cors.allow_credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::from(Any)
        }
    } else {
        let headers: Vec<HeaderName> = cors
            .allowed_headers
            .iter()
            .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
            .collect();
        AllowHeaders::list(headers)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(cors.allow_credentials);
    if let Some(secs) = cors.max_age_secs {
        layer = layer.max_age(Duration::from_secs(secs));
    }
    layer
}
