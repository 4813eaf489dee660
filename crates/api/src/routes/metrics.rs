//! Prometheus metrics endpoint.
//!
//! Exposes the booking counters recorded by the booking service
//! (`bookings_created_total`, `booking_rejections_total`,
//! `bookings_cancelled_total`, `booking_promotions_total`) and the HTTP
//! layer's `api_errors_total`.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics — Prometheus text exposition.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_TEXT)],
        handle.render(),
    )
}
