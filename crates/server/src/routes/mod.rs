use std::time::Duration;

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::DeploymentImpl;

pub mod appointments;
pub mod availability;
pub mod catalog;
pub mod health;

pub fn router(deployment: DeploymentImpl) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let base_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(catalog::router())
        .merge(availability::router())
        .merge(appointments::router());

    Router::new()
        .nest("/api", base_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(deployment)
}
