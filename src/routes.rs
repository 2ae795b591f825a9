// routes.rs
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::{header::CONTENT_TYPE, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::poll::PollStore;

pub fn create_routes<S: PollStore>(store: S) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(handlers::index))
        .route("/create", post(handlers::create_poll::<S>))
        .route("/vote", post(handlers::vote::<S>))
        .route("/{id}", get(handlers::show_poll::<S>))
        .route("/{id}/admin", get(handlers::show_admin::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
