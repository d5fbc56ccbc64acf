//! HTTP API server with observability for the order management system.
//!
//! Provides REST endpoints for persons, items, orders and order details,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware;
use axum::routing::{get, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the shared application state over a store.
pub fn create_state<S: Store>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    config: &Config,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/persons",
            get(routes::persons::list::<S>).post(routes::persons::create::<S>),
        )
        .route(
            "/persons/{id}",
            get(routes::persons::get::<S>)
                .put(routes::persons::update::<S>)
                .delete(routes::persons::delete::<S>),
        )
        .route(
            "/items",
            get(routes::items::list::<S>).post(routes::items::create::<S>),
        )
        .route(
            "/items/{id}",
            get(routes::items::get::<S>)
                .put(routes::items::update::<S>)
                .delete(routes::items::delete::<S>),
        )
        .route(
            "/orders",
            get(routes::orders::list::<S>).post(routes::orders::create::<S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>)
                .put(routes::orders::update::<S>)
                .delete(routes::orders::delete::<S>),
        )
        .route(
            "/orders/person/{person_id}",
            get(routes::orders::list_for_person::<S>),
        )
        .route(
            "/orders/{id}/details",
            get(routes::orders::list_details::<S>).post(routes::orders::add_detail::<S>),
        )
        .route(
            "/orders/details/{id}",
            get(routes::orders::get_detail::<S>).delete(routes::orders::remove_detail::<S>),
        )
        .route(
            "/orders/details/{id}/quantity",
            put(routes::orders::update_detail_quantity::<S>),
        )
        .route_layer(middleware::from_fn(routes::metrics::track))
        .with_state(state)
        .merge(metrics_router)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Allows any origin unless specific origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if allowed.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
