// Request metrics and access logging

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;
use tracing::info;

use crate::api::AppState;
use crate::core::errors::ProxyError;

pub const REQUESTS_TOTAL: &str = "puppetdb_proxy_http_requests_total";
pub const REQUEST_DURATION: &str = "puppetdb_proxy_http_requests_duration_seconds";
const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Prometheus collectors for inbound requests
///
/// Owns its registry; created once at startup and never reset.
pub struct ProxyMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl ProxyMetrics {
    pub fn new() -> Result<Self, ProxyError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(REQUESTS_TOTAL, "How many HTTP requests processed, partitioned by status code and HTTP method."),
            &["code", "method"],
        )
        .map_err(Self::registration_error)?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(REQUEST_DURATION, "The HTTP request latencies in seconds."),
            &["method", "uri", "status_code"],
        )
        .map_err(Self::registration_error)?;

        registry
            .register(Box::new(requests_total.clone()))
            .map_err(Self::registration_error)?;
        registry
            .register(Box::new(request_duration.clone()))
            .map_err(Self::registration_error)?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
        })
    }

    fn registration_error(e: prometheus::Error) -> ProxyError {
        ProxyError::ConfigurationError(format!("Failed to register metrics: {}", e))
    }

    pub fn observe(&self, method: &str, uri: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        self.requests_total.with_label_values(&[&status, method]).inc();
        self.request_duration
            .with_label_values(&[method, uri, &status])
            .observe(duration_secs);
    }

    /// Render every collector in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, ProxyError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| ProxyError::ConfigurationError(format!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| ProxyError::ConfigurationError(format!("Metrics are not UTF-8: {}", e)))
    }
}

fn endpoint_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ENDPOINT.to_string(), |path| path.as_str().to_string())
}

/// Middleware that records request metrics and writes one access log line
///
/// `uri` is the matched route template so label cardinality stays bounded.
pub async fn metrics_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = endpoint_label(&request);
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();
    state.metrics.observe(&method, &endpoint, status, duration.as_secs_f64());

    info!(
        method = %method,
        uri = %uri,
        status = status,
        duration_ms = duration.as_millis() as u64,
        "Request served"
    );

    response
}
