//! HTTP API server for the berth reservation engine.
//!
//! Provides REST endpoints for passengers, trains and bookings, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::BookingService;
use metrics_exporter_prometheus::PrometheusHandle;
use store::ReservationStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ReservationStore> {
    pub booking_service: BookingService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ReservationStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/users", post(routes::users::create::<S>))
        .route("/users/{id}", get(routes::users::get::<S>))
        .route("/trains", post(routes::trains::create::<S>))
        .route("/trains/{id}", get(routes::trains::get::<S>))
        .route("/trains/{id}/bookings", get(routes::trains::bookings::<S>))
        .route("/bookings", post(routes::bookings::create::<S>))
        .route(
            "/bookings/{id}",
            get(routes::bookings::get::<S>).delete(routes::bookings::cancel::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
pub fn create_default_state<S: ReservationStore + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        booking_service: BookingService::new(store),
    })
}
