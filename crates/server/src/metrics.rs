use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder};
use tracing::error;

use crate::routes::AppState;

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "warranty_hub_requests_total",
        "Resource requests by resource, operation and response status",
        &["resource", "operation", "status"]
    )
    .expect("register requests_total")
});

pub static REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "warranty_hub_request_duration_seconds",
        "Resource request duration in seconds",
        &["resource", "operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register request_duration")
});

/// Operation name for a resource route.
fn operation(method: &Method, has_id: bool) -> &'static str {
    match (method.as_str(), has_id) {
        ("GET", false) => "list",
        ("POST", false) => "create",
        ("GET", true) => "find",
        ("PUT" | "PATCH", true) => "update",
        ("DELETE", true) => "delete",
        _ => "other",
    }
}

/// Count and time requests to `/:resource[/:id]`. Names outside the registry
/// are folded into `unknown` to keep label cardinality bounded.
pub async fn track(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut segments = req.uri().path().trim_start_matches('/').split('/');
    let resource = match segments.next() {
        Some(name) if state.registry.get(name).is_some() => name.to_string(),
        _ => "unknown".to_string(),
    };
    let op = operation(req.method(), segments.next().is_some_and(|s| !s.is_empty()));

    let started = Instant::now();
    let res = next.run(req).await;

    REQUEST_DURATION
        .with_label_values(&[resource.as_str(), op])
        .observe(started.elapsed().as_secs_f64());
    REQUESTS_TOTAL
        .with_label_values(&[resource.as_str(), op, res.status().as_str()])
        .inc();
    res
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("encode metrics error: {e}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics encode error".to_string());
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

pub async fn metrics() -> (StatusCode, String) {
    encode_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_follow_method_and_shape() {
        assert_eq!(operation(&Method::GET, false), "list");
        assert_eq!(operation(&Method::POST, false), "create");
        assert_eq!(operation(&Method::GET, true), "find");
        assert_eq!(operation(&Method::PATCH, true), "update");
        assert_eq!(operation(&Method::PUT, true), "update");
        assert_eq!(operation(&Method::DELETE, true), "delete");
        assert_eq!(operation(&Method::DELETE, false), "other");
    }

    #[test]
    fn encoded_metrics_include_counters() {
        REQUESTS_TOTAL.with_label_values(&["claims", "create", "201"]).inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("warranty_hub_requests_total"));
    }
}
