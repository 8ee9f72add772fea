//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routedir_requests_total` (counter): dispatched requests by method, route, outcome
//! - `routedir_request_duration_seconds` (histogram): dispatch latency
//! - `routedir_routes_loaded` (gauge): size of the route table
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Route label is the pattern, never the concrete path
//! - Method label is one of the routable methods or `OTHER`; clients can
//!   send arbitrary method tokens

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Method label for anything outside the routable set.
pub const OTHER_METHOD: &str = "OTHER";

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must run inside a tokio runtime. Failure is logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            metrics::describe_counter!(
                "routedir_requests_total",
                "Requests dispatched by the routing engine"
            );
            metrics::describe_histogram!(
                "routedir_request_duration_seconds",
                "Time spent dispatching a request"
            );
            metrics::describe_gauge!("routedir_routes_loaded", "Routes in the route table");
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Bounded label for a request method.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::PATCH => "PATCH",
        Method::DELETE => "DELETE",
        _ => OTHER_METHOD,
    }
}

/// Record one dispatch. `method` should come from [`method_label`].
pub fn record_dispatch(method: &str, route: &str, outcome: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("outcome", outcome.to_string()),
    ];
    metrics::counter!("routedir_requests_total", &labels).increment(1);
    metrics::histogram!("routedir_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_routes_loaded(count: usize) {
    metrics::gauge!("routedir_routes_loaded").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_series(rendered: &str) -> usize {
        rendered
            .lines()
            .filter(|line| line.starts_with("routedir_requests_total{"))
            .count()
    }

    #[test]
    fn test_method_label_is_bounded() {
        assert_eq!(method_label(&Method::GET), "GET");
        assert_eq!(method_label(&Method::DELETE), "DELETE");
        assert_eq!(method_label(&Method::OPTIONS), OTHER_METHOD);
        let custom = Method::from_bytes(b"PURGE").unwrap();
        assert_eq!(method_label(&custom), OTHER_METHOD);
    }

    #[test]
    fn test_arbitrary_methods_share_one_series() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            for i in 0..50 {
                let method = Method::from_bytes(format!("X{i}").as_bytes()).unwrap();
                record_dispatch(method_label(&method), "none", "http_error", Instant::now());
            }
            record_dispatch(method_label(&Method::GET), "none", "http_error", Instant::now());
        });

        let rendered = handle.render();
        assert_eq!(request_series(&rendered), 2);
        assert!(rendered.contains(r#"method="OTHER""#));
    }
}
