use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::events::{
    create_event, delete_event, get_event, list_events, update_event, upcoming_events,
};
use crate::handlers::health_check;
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let request_tracing = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .route("/health", get(health_check))
        .route("/events", get(list_events).post(create_event))
        .route("/events/upcoming", get(upcoming_events))
        .route(
            "/events/:id",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .with_state(state)
        .layer(request_tracing)
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(config.cors_allowed_origins.as_deref()))
}
